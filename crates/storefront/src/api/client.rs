//! HTTP plumbing shared by every resource module.

use std::sync::Arc;
use std::time::Duration;

use gravis_core::GuestId;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use crate::config::ApiConfig;
use crate::middleware::request_id::REQUEST_ID_HEADER;

/// Header carrying the anonymous cart owner.
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// Maximum number of cached catalog responses.
const CACHE_CAPACITY: u64 = 1000;

/// Credentials of the visitor a request is made on behalf of.
///
/// Built per request from the session. Anonymous visitors have neither a
/// token nor, until their first cart update, a guest id.
#[derive(Clone, Default)]
pub struct Visitor {
    token: Option<SecretString>,
    guest_id: Option<GuestId>,
    request_id: Option<String>,
}

impl Visitor {
    /// A visitor with no credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn new(token: Option<SecretString>, guest_id: Option<GuestId>) -> Self {
        Self {
            token,
            guest_id,
            request_id: None,
        }
    }

    /// Forward this request id on backend calls.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Use the guest id the backend just handed out.
    #[must_use]
    pub fn with_guest_id(mut self, guest_id: GuestId) -> Self {
        self.guest_id = Some(guest_id);
        self
    }

    /// Whether a customer token is attached.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub const fn guest_id(&self) -> Option<&GuestId> {
        self.guest_id.as_ref()
    }

    /// Attach `Authorization`, `x-guest-id` and `x-request-id` headers.
    fn decorate(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(guest_id) = &self.guest_id {
            request = request.header(GUEST_ID_HEADER, guest_id.as_str());
        }
        if let Some(request_id) = &self.request_id {
            request = request.header(REQUEST_ID_HEADER, request_id.as_str());
        }
        request
    }
}

impl std::fmt::Debug for Visitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visitor")
            .field("authenticated", &self.token.is_some())
            .field("guest_id", &self.guest_id)
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Error body returned by the backend on failures.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-success response onto an [`ApiError`].
pub(super) fn classify(status: StatusCode, path: &str, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED if parsed.code.as_deref() == Some("unauthorized") => {
            ApiError::Unauthorized
        }
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
        s if s.is_server_error() => ApiError::Server {
            status: s.as_u16(),
        },
        s => ApiError::Rejected {
            status: s.as_u16(),
            message: parsed.message,
        },
    }
}

/// Client for the Gravis REST backend.
///
/// Cheap to clone; all clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, cache_ttl: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gravis-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Join an endpoint path onto the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    pub(super) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(?key, "Cache hit");
        }
        hit
    }

    pub(super) async fn cache(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// `GET path?query`.
    pub(super) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        visitor: &Visitor,
    ) -> Result<T, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let request = self.inner.client.request(Method::GET, url);
        self.execute(Method::GET, path, visitor.decorate(request))
            .await
    }

    /// Send `body` as JSON with the given method.
    pub(super) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        visitor: &Visitor,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let request = self.inner.client.request(method.clone(), url).json(body);
        self.execute(method, path, visitor.decorate(request)).await
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            error!(%method, path, error = %e, "Backend request failed");
            ApiError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%method, path, status = status.as_u16(), "Backend responded");

        if !status.is_success() {
            let err = classify(status, path, &body);
            if err.is_server_error() {
                error!(
                    %method,
                    path,
                    status = status.as_u16(),
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                warn!(%method, path, status = status.as_u16(), error = %err, "Backend rejected request");
            }
            return Err(err);
        }

        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| {
            error!(
                %method,
                path,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to decode backend response"
            );
            ApiError::Decode(e)
        })
    }
}

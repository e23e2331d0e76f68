//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    img_src: String,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api, config.catalog_cache_ttl)?;
        let img_src = image_sources(&config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                img_src,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// `img-src` sources for the content security policy.
    #[must_use]
    pub fn img_src(&self) -> &str {
        &self.inner.img_src
    }
}

/// Image hosts: our own origin, the file host and the API host (images are
/// served from whichever the backend puts in `url`).
fn image_sources(config: &StorefrontConfig) -> String {
    let mut sources = vec!["'self'".to_string(), "data:".to_string()];
    let hosts = std::iter::once(&config.api.base_url).chain(config.api.file_url.as_ref());
    for url in hosts {
        let origin = url.origin().ascii_serialization();
        if origin != "null" && !sources.contains(&origin) {
            sources.push(origin);
        }
    }
    sources.join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_image_sources_include_backend_hosts() {
        let mut config = test_config("https://api.gravis.example/v1");
        config.api.file_url = Some(url::Url::parse("https://files.gravis.example/").unwrap());

        let state = AppState::new(config).unwrap();
        assert_eq!(
            state.img_src(),
            "'self' data: https://api.gravis.example https://files.gravis.example"
        );
    }
}

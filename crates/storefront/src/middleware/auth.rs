//! Authentication extractors and session helpers.
//!
//! The customer's token, the guest cart id and any pending registration
//! live in the session. Every request rehydrates them from there; entries
//! that fail to deserialize or whose token has expired count as logged out.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::{Method, Uri, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use gravis_core::GuestId;
use tower_sessions::{Expiry, Session, cookie::time::OffsetDateTime};

use crate::api::{RegisterCustomerRequest, Visitor};
use crate::error::{SessionExpired, clear_sentry_user};
use crate::htmx::{self, HxRequest};
use crate::middleware::request_id::RequestId;
use crate::models::{CurrentCustomer, session_keys};

/// Login URL that returns to `return_to` after signing in.
#[must_use]
pub fn login_url(return_to: &str) -> String {
    format!("/login?redirect_url={}", urlencoding::encode(return_to))
}

/// The URI the client asked for, before any router nesting stripped a
/// prefix from it.
#[must_use]
pub fn original_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri)
}

/// Path and query to return to after login.
///
/// HTMX requests return to the page the visitor is on rather than the
/// fragment endpoint they hit. Plain form posts return to the page that
/// owns the form action (`/products/p1/enquiry` goes back to
/// `/products/p1`), since the action itself only answers POST.
fn return_path(parts: &Parts) -> String {
    if HxRequest::from_parts(parts).0
        && let Some(current) = parts
            .headers
            .get(htmx::HX_CURRENT_URL)
            .and_then(|v| v.to_str().ok())
        && let Ok(url) = url::Url::parse(current)
    {
        return match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
    }

    let uri = original_uri(parts);
    if parts.method != Method::GET && parts.method != Method::HEAD {
        return form_page(uri.path()).to_string();
    }
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

/// Page a form action path belongs to: the path without its last segment.
fn form_page(action: &str) -> &str {
    match action.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((page, _)) => page,
    }
}

async fn load_customer(session: &Session) -> Option<CurrentCustomer> {
    let customer = session
        .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()?;

    if customer.is_expired(Utc::now()) {
        tracing::debug!("Session token expired, treating visitor as logged out");
        return None;
    }

    Some(customer)
}

async fn load_guest_id(session: &Session) -> Option<GuestId> {
    session
        .get::<GuestId>(session_keys::GUEST_ID)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires customer authentication.
///
/// If the customer is not logged in, redirects to the login page with a
/// `redirect_url` pointing back at the current page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.customer.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Rejection for [`RequireAuth`]: a redirect to `/login`.
pub struct AuthRejection {
    hx: HxRequest,
    return_to: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        htmx::redirect(self.hx, &login_url(&self.return_to))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let rejection = || AuthRejection {
            hx: HxRequest::from_parts(parts),
            return_to: return_path(parts),
        };

        let session = parts.extensions.get::<Session>().ok_or_else(rejection)?;
        let customer = load_customer(session).await.ok_or_else(rejection)?;

        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer
/// is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => load_customer(session).await,
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Backend credentials for the current request.
impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (token, guest_id) = match parts.extensions.get::<Session>() {
            Some(session) => (
                load_customer(session).await.map(|c| c.token()),
                load_guest_id(session).await,
            ),
            None => (None, None),
        };

        let visitor = Self::new(token, guest_id);
        Ok(match RequestId::from_parts(parts) {
            Some(id) => visitor.with_request_id(id.0),
            None => visitor,
        })
    }
}

/// Store the signed-in customer. The session expires with the token.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    // Fresh id on privilege change.
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await?;

    match OffsetDateTime::from_unix_timestamp(customer.expires_at.timestamp()) {
        Ok(at) => session.set_expiry(Some(Expiry::AtDateTime(at))),
        Err(e) => tracing::warn!(error = %e, "Token expiry out of range, keeping session expiry"),
    }

    Ok(())
}

/// Clear the signed-in customer (logout).
///
/// The guest cart id survives so the anonymous cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    session
        .remove::<RegisterCustomerRequest>(session_keys::PENDING_REGISTRATION)
        .await?;
    session.set_expiry(None);
    session.cycle_id().await?;
    Ok(())
}

/// Sign the visitor out when a backend call reported their token as
/// expired, and send them to `/login` with a way back.
///
/// Handlers signal this by returning `AppError::Api(ApiError::Unauthorized)`,
/// which marks the response with [`SessionExpired`].
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let hx = HxRequest::from_parts(&parts);
    let return_to = return_path(&parts);

    let response = next.run(Request::from_parts(parts, body)).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    tracing::info!("Backend rejected session token, signing visitor out");
    if let Err(e) = clear_current_customer(&session).await {
        tracing::warn!(error = %e, "Failed to clear expired session");
    }
    clear_sentry_user();

    htmx::redirect(hx, &login_url(&return_to))
}

/// Persist the guest cart id handed out by the backend.
pub async fn remember_guest_id(session: &Session, guest_id: &GuestId) {
    if let Err(e) = session.insert(session_keys::GUEST_ID, guest_id).await {
        tracing::warn!(error = %e, "Failed to store guest id");
    }
}

/// Remember a registration so the verification code can be re-sent.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_pending_registration(
    session: &Session,
    registration: &RegisterCustomerRequest,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::PENDING_REGISTRATION, registration)
        .await
}

/// The registration awaiting verification, if any.
pub async fn pending_registration(session: &Session) -> Option<RegisterCustomerRequest> {
    session
        .get::<RegisterCustomerRequest>(session_keys::PENDING_REGISTRATION)
        .await
        .ok()
        .flatten()
}

/// Forget the pending registration after successful verification.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_pending_registration(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<RegisterCustomerRequest>(session_keys::PENDING_REGISTRATION)
        .await?;
    Ok(())
}

//! HTMX request detection and response helpers.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

/// Request header set by HTMX on every request it issues.
pub const HX_REQUEST: &str = "HX-Request";

/// Request header with the id of the element being swapped.
pub const HX_TARGET: &str = "HX-Target";

/// Request header with the browser's current URL.
pub const HX_CURRENT_URL: &str = "HX-Current-URL";

/// Response header overriding the swap target.
pub const HX_RETARGET: &str = "HX-Retarget";

/// Response header overriding the swap style.
pub const HX_RESWAP: &str = "HX-Reswap";

/// Response header asking HTMX to perform a full-page navigation.
pub const HX_REDIRECT: &str = "HX-Redirect";

/// Response header carrying client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

/// Whether the request was issued by HTMX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HxRequest(pub bool);

impl HxRequest {
    /// Check the request headers.
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        Self(
            parts
                .headers
                .get(HX_REQUEST)
                .is_some_and(|v| v.as_bytes() == b"true"),
        )
    }
}

impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Id of the element an HTMX request will swap, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HxTarget(pub Option<String>);

impl HxTarget {
    /// Whether the request targets the element with this id.
    #[must_use]
    pub fn is(&self, id: &str) -> bool {
        self.0.as_deref() == Some(id)
    }
}

impl<S> FromRequestParts<S> for HxTarget
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get(HX_TARGET)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        ))
    }
}

/// Navigate to `to`: `HX-Redirect` for HTMX requests, `303 See Other`
/// otherwise.
#[must_use]
pub fn redirect(hx: HxRequest, to: &str) -> Response {
    if hx.0
        && let Ok(value) = HeaderValue::from_str(to)
    {
        return (StatusCode::OK, [(HX_REDIRECT, value)]).into_response();
    }
    Redirect::to(to).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_redirect_plain_request() {
        let response = redirect(HxRequest(false), "/login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
    }

    #[test]
    fn test_redirect_htmx_request() {
        let response = redirect(HxRequest(true), "/login?redirect_url=%2Fcart");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            "/login?redirect_url=%2Fcart"
        );
    }
}

//! Gravis Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. [`app`] builds the complete router
//! with its middleware stack; the binary only adds the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod htmx;
pub mod layout;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::ConfigError;
use crate::error::AppError;
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront router.
///
/// # Middleware Order (outermost first)
///
/// Sentry, tracing, request id, security headers, session, session expiry,
/// then per-route rate limits.
///
/// # Errors
///
/// Returns an error if the session layer cannot be configured.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let session_layer = middleware::create_session_layer(state.config())?;

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ))
        .service(ServeDir::new(STATIC_DIR));

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .fallback(not_found)
        .layer(from_fn(middleware::session_expiry_middleware))
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the backend answers before returning OK.
/// Returns 503 Service Unavailable if it does not.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("route".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{self, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::tests::test_config;
    use crate::htmx::{HX_REDIRECT, HX_REQUEST, HX_TARGET, HX_TRIGGER};

    fn test_app(server: &MockServer) -> Router {
        app(AppState::new(test_config(&server.uri())).unwrap()).unwrap()
    }

    async fn mock_catalog(server: &MockServer, products: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/product-categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/product-categories/banners"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        request
    }

    /// `name=value` of the session cookie a response sets, if any.
    fn session_cookie(response: &axum::response::Response) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(middleware::session::SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }

    async fn mock_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/customers/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customer": {
                    "id": "0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f",
                    "first_name": "Asha",
                    "last_name": "Rao",
                    "full_name": "Asha Rao",
                    "email": "asha@example.com",
                    "phone_number": "+91 98765 43210",
                    "is_email_verified": true,
                    "created_at": "2026-01-05T10:00:00Z"
                },
                "token": "tok-abc",
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .mount(server)
            .await;
    }

    /// Sign in through `/login` and return the session cookie.
    async fn sign_in(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(form_post(
                "/login",
                "email=asha%40example.com&password=secret123&redirect_url=%2F",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).unwrap()
    }

    fn cart_json(quantity: u32) -> serde_json::Value {
        json!({
            "items": [{
                "quantity": quantity,
                "product_id": "p1",
                "product_name": "Silent Diesel Genset",
                "sale_price_in_paisa": 10_000_000
            }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_layout_images_are_served() {
        let server = MockServer::start().await;
        let router = test_app(&server);
        let images = [
            "/static/images/favicon.svg",
            "/static/images/logo.svg",
            "/static/images/logo-light.svg",
            routes::products::DEFAULT_BANNER_URL,
        ]
        .into_iter()
        .chain(routes::home::HERO_SLIDES.iter().map(|slide| slide.image_path));

        for image in images {
            let response = router
                .clone()
                .oneshot(Request::get(image).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{image}");
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                "image/svg+xml",
                "{image}"
            );
        }
    }

    #[tokio::test]
    async fn test_readiness_follows_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product-categories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_products_page_renders_cards_with_csp() {
        let server = MockServer::start().await;
        mock_catalog(
            &server,
            json!([{"id": "p1", "name": "Silent Diesel Genset", "sale_price_in_paisa": 10_000_000}]),
        )
        .await;

        let response = test_app(&server)
            .oneshot(Request::get("/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_text(response).await;
        assert!(body.contains("Silent Diesel Genset"));
        assert!(body.contains("₹1,00,000"));
        assert!(body.contains("<html"));
    }

    #[tokio::test]
    async fn test_catalog_fragment_for_htmx() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;

        let response = test_app(&server)
            .oneshot(
                Request::get("/products?search=nothing")
                    .header(HX_REQUEST, "true")
                    .header(HX_TARGET, "catalog")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"id="catalog""#));
        assert!(body.contains("No products found. Try adjusting your search or filters."));
        assert!(!body.contains("<html"));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;
        Mock::given(method("GET"))
            .and(path("/products/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .oneshot(Request::get("/products/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_to_cart_triggers_badge_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .and(body_json(json!({"quantity": 1})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"product_id": "p1", "guest_id": "g-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = test_app(&server)
            .oneshot(form_post("/cart/add", "product_id=p1&product_name=Genset"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let trigger = response.headers().get(HX_TRIGGER).unwrap().to_str().unwrap();
        assert!(trigger.contains("cart-updated"));
        assert!(trigger.contains("Added Genset to cart"));
    }

    #[tokio::test]
    async fn test_enquiry_requires_login() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;
        mock_login(&server).await;
        let router = test_app(&server);

        let response = router
            .clone()
            .oneshot(form_post("/products/p1/enquiry", "message=hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirect_url=%2Fproducts%2Fp1"
        );

        // Signing in lands on the product page with the enquiry open.
        let response = router
            .oneshot(form_post(
                "/login",
                "email=asha%40example.com&password=secret123&redirect_url=%2Fproducts%2Fp1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/products/p1?open_enquiry=true"
        );
    }

    #[tokio::test]
    async fn test_htmx_enquiry_redirects_to_current_page() {
        let server = MockServer::start().await;
        let mut request = form_post("/products/p1/enquiry", "message=hello");
        request
            .headers_mut()
            .insert(HX_REQUEST, HeaderValue::from_static("true"));
        request.headers_mut().insert(
            crate::htmx::HX_CURRENT_URL,
            HeaderValue::from_static("http://localhost:3000/products/p1"),
        );

        let response = test_app(&server).oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            "/login?redirect_url=%2Fproducts%2Fp1"
        );
    }

    #[tokio::test]
    async fn test_login_validation_is_bad_request() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;

        let response = test_app(&server)
            .oneshot(form_post("/login", "email=not-an-email&password="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("Please enter a valid email"));
        assert!(body.contains("Password is required"));
    }

    #[tokio::test]
    async fn test_contact_validation_returns_form_fragment() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .oneshot(form_post(
                "/contact",
                "first_name=&last_name=&email=bad&phone=&message=",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains(r#"id="contact-form""#));
        assert!(body.contains("First name is required"));
    }

    #[tokio::test]
    async fn test_expired_token_signs_out_and_redirects_to_login() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;
        mock_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .and(matchers::header("authorization", "Bearer tok-abc"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "unauthorized"})))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let router = test_app(&server);
        let cookie = sign_in(&router).await;

        let response = router
            .clone()
            .oneshot(with_cookie(
                Request::get("/cart").body(Body::empty()).unwrap(),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirect_url=%2Fcart"
        );
        let cookie = session_cookie(&response).unwrap_or(cookie);

        let response = router
            .oneshot(with_cookie(
                Request::get("/cart/count").body(Body::empty()).unwrap(),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cart_calls: Vec<_> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/cart")
            .collect();
        assert_eq!(cart_calls.len(), 2);
        assert!(cart_calls.first().unwrap().headers.contains_key("authorization"));
        assert!(!cart_calls.last().unwrap().headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_expired_token_on_htmx_request_uses_hx_redirect() {
        let server = MockServer::start().await;
        mock_catalog(&server, json!([])).await;
        mock_login(&server).await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "unauthorized"})))
            .expect(1)
            .mount(&server)
            .await;

        let router = test_app(&server);
        let cookie = sign_in(&router).await;

        let mut request = with_cookie(form_post("/cart/p1", "action=inc&current=1"), &cookie);
        request
            .headers_mut()
            .insert(HX_REQUEST, HeaderValue::from_static("true"));
        request.headers_mut().insert(
            crate::htmx::HX_CURRENT_URL,
            HeaderValue::from_static("http://localhost:3000/cart"),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            "/login?redirect_url=%2Fcart"
        );
    }

    #[tokio::test]
    async fn test_guest_id_is_sent_on_later_requests() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"product_id": "p1", "guest_id": "g-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .and(matchers::header("x-guest-id", "g-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(3)))
            .expect(1)
            .mount(&server)
            .await;

        let router = test_app(&server);
        let response = router
            .clone()
            .oneshot(form_post("/cart/add", "product_id=p1&product_name=Genset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = session_cookie(&response).unwrap();

        let response = router
            .oneshot(with_cookie(
                Request::get("/cart/count").body(Body::empty()).unwrap(),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"<span class="cart-badge">3</span>"#));
    }

    #[tokio::test]
    async fn test_cart_remove_action_clears_line_with_toast() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .and(body_json(json!({"quantity": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product_id": "p1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .oneshot(form_post("/cart/p1", "action=remove&current=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let trigger = response.headers().get(HX_TRIGGER).unwrap().to_str().unwrap();
        assert!(trigger.contains("cart-updated"));
        assert!(trigger.contains("Item removed from cart"));
    }

    #[tokio::test]
    async fn test_cart_set_out_of_range_sends_no_update() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product_id": "p1"})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(2)))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .oneshot(form_post("/cart/p1", "action=set&current=2&quantity=500"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_TRIGGER).is_none());
        assert!(body_text(response).await.contains("Silent Diesel Genset"));
    }
}

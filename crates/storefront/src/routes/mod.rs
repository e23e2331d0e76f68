//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//! GET  /about                         - About page
//! GET  /contact                       - Contact page
//! POST /contact                       - Contact enquiry (HTMX fragment)
//!
//! # Products
//! GET  /products                      - Product listing (catalog fragment for HTMX)
//! GET  /products/more?offset=         - Next page of cards (HTMX)
//! GET  /products/{id}                 - Product detail
//! POST /products/{id}/enquiry         - Enquiry from a signed-in customer (HTMX)
//! POST /products/{id}/guest-enquiry   - Enquiry without an account (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                          - Cart page
//! GET  /cart/count                    - Cart count badge (fragment)
//! POST /cart/add                      - Add to cart (204, triggers cart-updated)
//! POST /cart/{product_id}             - Change quantity (returns items fragment)
//!
//! # Auth
//! GET  /login                         - Login page
//! POST /login                         - Login action
//! GET  /register                      - Register page
//! POST /register                      - Register action
//! GET  /verify-email                  - Verification page
//! POST /verify-email                  - Submit one-time code
//! POST /verify-email/resend           - Re-send the code
//! POST /logout                        - Logout action
//! ```
//!
//! Form posts are rate limited per client IP; page loads are not.

pub mod auth;
pub mod cart;
pub mod contact;
pub mod enquiry;
pub mod home;
pub mod pages;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, cart_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route(
            "/verify-email",
            get(auth::verify_email_page).merge(post(auth::verify_email).layer(limiter.clone())),
        )
        .route(
            "/verify-email/resend",
            post(auth::resend_code).layer(limiter),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    let limiter = form_rate_limiter();

    Router::new()
        .route("/", get(products::index))
        .route("/more", get(products::more))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/enquiry",
            post(enquiry::submit).layer(limiter.clone()),
        )
        .route(
            "/{id}/guest-enquiry",
            post(enquiry::submit_guest).layer(limiter),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let limiter = cart_rate_limiter();

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add).layer(limiter.clone()))
        .route("/{product_id}", post(cart::update).layer(limiter))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(home::home))
        .route("/about", get(pages::about))
        .route(
            "/contact",
            get(contact::show).merge(post(contact::submit).layer(form_rate_limiter())),
        )
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Auth routes
        .merge(auth_routes())
}

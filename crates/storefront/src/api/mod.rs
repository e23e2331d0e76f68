//! Client for the Gravis REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth; nothing is stored locally
//! - One pooled `reqwest` client, shared through [`ApiClient`]
//! - Catalog reads (categories, banners, filters, anonymous product
//!   detail) are cached in `moka`; cart and customer data never are
//!
//! Each resource lives in its own module as an `impl ApiClient` block:
//!
//! - [`products`] - listing and detail
//! - [`categories`] - categories, banners and per-category filters
//! - [`cart`] - the visitor's cart
//! - [`inquiry`] - product, guest and contact enquiries
//! - [`customers`] - registration, email verification and login

mod cache;
pub mod cart;
pub mod categories;
mod client;
pub mod customers;
pub mod inquiry;
pub mod products;
pub mod types;

pub use client::{ApiClient, Visitor};
pub use products::ProductFilter;
pub use types::*;

use thiserror::Error;

/// Message shown when the backend answers 403.
pub const FORBIDDEN_MESSAGE: &str = "You are not allowed to access this resource";

/// Message shown when the backend fails with a 5xx.
pub const SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// The visitor's token is missing, expired or revoked.
    #[error("Session expired")]
    Unauthorized,

    /// The visitor may not access the resource.
    #[error("{FORBIDDEN_MESSAGE}")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend failed with a 5xx.
    #[error("{SERVER_ERROR_MESSAGE} ({status})")]
    Server { status: u16 },

    /// Backend rejected the request (4xx), usually a validation failure.
    #[error("API error: {status} - {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl ApiError {
    /// Message suitable for showing to the visitor.
    ///
    /// Backend validation messages are passed through; everything else
    /// collapses to `fallback` or a fixed message.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Forbidden => FORBIDDEN_MESSAGE.to_string(),
            Self::Server { .. } => SERVER_ERROR_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the failure is on our side or upstream rather than the
    /// visitor's input.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Decode(_) | Self::Url(_) | Self::Server { .. }
        )
    }
}

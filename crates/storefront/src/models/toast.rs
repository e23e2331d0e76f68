//! Toast notifications.
//!
//! HTMX responses carry the toast in an `HX-Trigger` header that the page
//! script turns into a notification. Full-page redirects store it in the
//! session as a flash and the next page renders it once.

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

/// A notification shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    /// `HX-Trigger` value raising a `toast` event, plus any extra events.
    ///
    /// Extra events are raised with a `true` payload, e.g. `cart-updated`.
    #[must_use]
    pub fn hx_trigger(&self, extra_events: &[&str]) -> HeaderValue {
        let mut events = serde_json::Map::new();
        events.insert(
            "toast".to_string(),
            serde_json::to_value(self).unwrap_or_default(),
        );
        for event in extra_events {
            events.insert((*event).to_string(), serde_json::Value::Bool(true));
        }
        let body = ascii_json(&serde_json::Value::Object(events).to_string());
        HeaderValue::from_str(&body).unwrap_or_else(|_| HeaderValue::from_static("toast"))
    }

    /// CSS class used by the toast partial.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            ToastLevel::Success => "toast toast-success",
            ToastLevel::Error => "toast toast-error",
        }
    }
}

/// Escape non-ASCII characters as `\uXXXX` so the JSON fits in a header.
fn ascii_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Store a toast to show after the next redirect.
pub async fn set_flash(session: &Session, toast: Toast) {
    if let Err(e) = session.insert(keys::FLASH, toast).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending flash toast, if any.
pub async fn take_flash(session: &Session) -> Option<Toast> {
    session.remove::<Toast>(keys::FLASH).await.ok().flatten()
}

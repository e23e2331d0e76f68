//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::api::Customer;

/// Session-stored customer identity.
///
/// The token lives server-side in the session store; the browser only holds
/// the signed session id.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer profile as returned at login.
    pub customer: Customer,
    /// Bearer token for backend calls.
    token: String,
    /// When the backend stops accepting `token`.
    pub expires_at: DateTime<Utc>,
}

impl CurrentCustomer {
    #[must_use]
    pub fn new(customer: Customer, token: &SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            customer,
            token: token.expose_secret().to_string(),
            expires_at,
        }
    }

    /// Bearer token for backend calls.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("customer", &self.customer.id)
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the backend-issued guest cart id.
    pub const GUEST_ID: &str = "guest_id";

    /// Key for the registration awaiting email verification.
    pub const PENDING_REGISTRATION: &str = "pending_registration";

    /// Key for the one-shot toast shown after a redirect.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn customer() -> Customer {
        serde_json::from_value(json!({
            "id": "c1",
            "first_name": "Asha",
            "email": "asha@example.com"
        }))
        .unwrap()
    }

    #[test]
    fn test_token_roundtrips_through_session_json() {
        let now = Utc::now();
        let current = CurrentCustomer::new(
            customer(),
            &SecretString::from("tok-1".to_string()),
            now + Duration::hours(1),
        );

        let stored = serde_json::to_value(&current).unwrap();
        let restored: CurrentCustomer = serde_json::from_value(stored).unwrap();
        assert_eq!(restored.token().expose_secret(), "tok-1");
        assert!(!restored.is_expired(now));
        assert!(restored.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let current = CurrentCustomer::new(
            customer(),
            &SecretString::from("tok-secret".to_string()),
            Utc::now(),
        );
        assert!(!format!("{current:?}").contains("tok-secret"));
    }
}

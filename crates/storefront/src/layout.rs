//! Data every full page needs for the shared header and footer.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::api::ProductCategory;
use crate::catalog::category_url;
use crate::middleware::auth::{OptionalAuth, login_url, original_uri};
use crate::middleware::CspNonce;
use crate::models::toast::{Toast, take_flash};
use crate::state::AppState;

/// A category in the header's product menu.
#[derive(Debug, Clone)]
pub struct NavCategory {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
}

impl From<&ProductCategory> for NavCategory {
    fn from(category: &ProductCategory) -> Self {
        Self {
            name: category.name.clone(),
            url: category_url(&category.id),
            image_url: category.image.as_ref().map(|img| img.url.clone()),
        }
    }
}

/// Shared layout context.
///
/// Extracting it consumes the pending flash toast, so only full-page
/// handlers should ask for it.
#[derive(Debug, Clone)]
pub struct Layout {
    /// CSP nonce for inline scripts.
    pub nonce: String,
    /// Current request path, for active nav links.
    pub path: String,
    /// Header product menu.
    pub categories: Vec<NavCategory>,
    /// Signed-in customer's name.
    pub customer_name: Option<String>,
    /// Login link returning to the current page.
    pub login_href: String,
    /// Toast carried over from a redirect.
    pub flash: Option<Toast>,
    /// Whether this is a staging deployment.
    pub staging: bool,
}

impl Layout {
    #[must_use]
    pub fn is_active(&self, href: &str) -> bool {
        if href == "/" {
            self.path == "/"
        } else {
            self.path == href || self.path.starts_with(&format!("{href}/"))
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.customer_name.is_some()
    }

    /// First letter of the customer's name for the account badge.
    #[must_use]
    pub fn customer_initial(&self) -> String {
        self.customer_name
            .as_deref()
            .and_then(|name| name.trim().chars().next())
            .map_or_else(|| "C".to_string(), |c| c.to_uppercase().to_string())
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();
        let uri = original_uri(parts);
        let path = uri.path().to_string();
        let login_href = login_url(uri.path_and_query().map_or(path.as_str(), |pq| pq.as_str()));

        let Ok(OptionalAuth(customer)) = OptionalAuth::from_request_parts(parts, state).await;
        let session = parts.extensions.get::<Session>().cloned();

        let (categories, flash) = tokio::join!(state.api().list_categories_or_empty(), async {
            match &session {
                Some(session) => take_flash(session).await,
                None => None,
            }
        });

        Ok(Self {
            nonce,
            path,
            categories: categories.iter().map(NavCategory::from).collect(),
            customer_name: customer.map(|c| c.customer.display_name().to_string()),
            login_href,
            flash,
            staging: state.config().staging,
        })
    }
}

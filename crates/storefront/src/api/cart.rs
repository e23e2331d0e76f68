//! Cart endpoints.
//!
//! The backend keys carts by customer token or, for anonymous visitors, by
//! the guest id it hands out on the first update. Persisting that id is the
//! caller's job (see `middleware::auth::remember_guest_id`).

use gravis_core::ProductId;
use reqwest::Method;
use tracing::instrument;

use super::client::{ApiClient, Visitor};
use super::types::{Cart, UpdateCartRequest, UpdateCartResponse};
use super::ApiError;

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: u32 = 100;

/// Outcome of resolving a requested quantity against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Nothing to send.
    Unchanged,
    /// Set the line to this quantity.
    Set(u32),
    /// Remove the line.
    Remove,
}

/// Resolve a requested quantity.
///
/// Requests outside `[0, MAX_QUANTITY]` and requests equal to `current`
/// are ignored; zero removes the line.
#[must_use]
pub fn resolve_quantity(current: u32, requested: i64) -> QuantityChange {
    let Ok(requested) = u32::try_from(requested) else {
        return QuantityChange::Unchanged;
    };
    if requested > MAX_QUANTITY || requested == current {
        QuantityChange::Unchanged
    } else if requested == 0 {
        QuantityChange::Remove
    } else {
        QuantityChange::Set(requested)
    }
}

/// Quantity after pressing "+", clamped to [`MAX_QUANTITY`].
#[must_use]
pub fn increment(current: u32) -> u32 {
    current.saturating_add(1).min(MAX_QUANTITY)
}

/// Quantity after pressing "-". Never below zero.
#[must_use]
pub const fn decrement(current: u32) -> u32 {
    current.saturating_sub(1)
}

impl ApiClient {
    /// Fetch the visitor's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, visitor: &Visitor) -> Result<Cart, ApiError> {
        let cart: Option<Cart> = self.get("/cart", &[], visitor).await?;
        Ok(cart.unwrap_or_default())
    }

    /// Set the quantity of a cart line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        visitor: &Visitor,
    ) -> Result<UpdateCartResponse, ApiError> {
        let path = format!("/cart/{}", urlencoding::encode(product_id.as_str()));
        self.send_json(
            Method::PUT,
            &path,
            &UpdateCartRequest {
                quantity: quantity.min(MAX_QUANTITY),
            },
            visitor,
        )
        .await
    }
}

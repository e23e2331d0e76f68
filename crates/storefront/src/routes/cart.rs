//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every change is a single `PUT /cart/{product_id}` followed by a fresh
//! `GET /cart`; nothing about the cart is cached. Anonymous carts are keyed
//! by the guest id the backend hands out on the first update.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gravis_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::cart::{MAX_QUANTITY, QuantityChange, decrement, increment, resolve_quantity};
use crate::api::{ApiError, Cart, CartItem, Visitor};
use crate::error::Result;
use crate::filters;
use crate::htmx::HX_TRIGGER;
use crate::layout::Layout;
use crate::middleware::remember_guest_id;
use crate::models::Toast;
use crate::state::AppState;

/// Event telling the header badge to refresh.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub url: String,
    pub update_url: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub line_total: String,
    pub can_decrement: bool,
    pub can_increment: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let id = urlencoding::encode(item.product_id.as_str()).into_owned();
        Self {
            product_id: item.product_id.to_string(),
            url: format!("/products/{id}"),
            update_url: format!("/cart/{id}"),
            name: item.product_name.clone(),
            description: item.description.clone(),
            image_url: item
                .primary_image
                .as_ref()
                .map(|img| img.url.clone())
                .filter(|url| !url.is_empty()),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            can_decrement: item.quantity > 1,
            can_increment: item.quantity < MAX_QUANTITY,
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartLineView::from).collect(),
            total: cart.subtotal().display(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: Option<u32>,
}

/// Quantity control pressed on a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Inc,
    Dec,
    Remove,
    Set,
}

/// Update cart form data.
///
/// `current` is the quantity the page showed, so no extra fetch is needed to
/// resolve the change. `quantity` is the raw input of the `set` control; a
/// blank or non-numeric value keeps the current quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub action: CartAction,
    pub current: u32,
    #[serde(default)]
    pub quantity: String,
}

impl UpdateCartForm {
    /// The quantity this action asks for.
    #[must_use]
    pub fn requested(&self) -> i64 {
        match self.action {
            CartAction::Inc => i64::from(increment(self.current)),
            CartAction::Dec => i64::from(decrement(self.current)),
            CartAction::Remove => 0,
            CartAction::Set => self
                .quantity
                .trim()
                .parse()
                .unwrap_or_else(|_| i64::from(self.current)),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    /// `None` when the cart could not be loaded.
    pub cart: Option<CartView>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "cart/items.html")]
pub struct CartItemsTemplate {
    pub cart: Option<CartView>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "cart/count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Store a newly issued guest id and use it for follow-up calls.
async fn adopt_guest_id(
    session: &Session,
    visitor: Visitor,
    guest_id: Option<gravis_core::GuestId>,
) -> Visitor {
    match guest_id {
        Some(guest_id) if visitor.guest_id() != Some(&guest_id) => {
            remember_guest_id(session, &guest_id).await;
            visitor.with_guest_id(guest_id)
        }
        _ => visitor,
    }
}

async fn load_cart(state: &AppState, visitor: &Visitor) -> Result<Option<CartView>> {
    match state.api().get_cart(visitor).await {
        Ok(cart) => Ok(Some(CartView::from(&cart))),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            Ok(None)
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, visitor, layout))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    layout: Layout,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&state, &visitor).await?;
    Ok(CartShowTemplate { layout, cart })
}

/// Add item to cart (HTMX).
///
/// Returns no content; the toast and the `cart-updated` event refresh the
/// page.
#[instrument(skip(state, session, visitor), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity.unwrap_or(1).clamp(1, MAX_QUANTITY);

    match state
        .api()
        .update_cart_item(&product_id, quantity, &visitor)
        .await
    {
        Ok(updated) => {
            adopt_guest_id(&session, visitor, updated.guest_id).await;
            let name = match form.product_name.trim() {
                "" => "item",
                name => name,
            };
            let toast = Toast::success(format!("Added {name} to cart"));
            Ok((
                StatusCode::NO_CONTENT,
                [(HX_TRIGGER, toast.hx_trigger(&[CART_UPDATED_EVENT]))],
            )
                .into_response())
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add item to cart");
            Ok((
                StatusCode::NO_CONTENT,
                [(HX_TRIGGER, Toast::error("Failed to add to cart").hx_trigger(&[]))],
            )
                .into_response())
        }
    }
}

/// Change a line's quantity (HTMX). Returns the refreshed items fragment.
#[instrument(skip(state, session, visitor))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Path(product_id): Path<String>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(product_id);

    let quantity = match resolve_quantity(form.current, form.requested()) {
        QuantityChange::Unchanged => None,
        QuantityChange::Set(quantity) => Some(quantity),
        QuantityChange::Remove => Some(0),
    };

    let Some(quantity) = quantity else {
        let cart = load_cart(&state, &visitor).await?;
        return Ok(CartItemsTemplate { cart }.into_response());
    };

    let (visitor, toast) = match state
        .api()
        .update_cart_item(&product_id, quantity, &visitor)
        .await
    {
        Ok(updated) => {
            let visitor = adopt_guest_id(&session, visitor, updated.guest_id).await;
            let toast = (quantity == 0).then(|| Toast::success("Item removed from cart"));
            (visitor, toast)
        }
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to update cart");
            (visitor, Some(Toast::error("Failed to update cart")))
        }
    };

    let cart = load_cart(&state, &visitor).await?;
    let trigger = match &toast {
        Some(toast) => toast.hx_trigger(&[CART_UPDATED_EVENT]),
        None => axum::http::HeaderValue::from_static(CART_UPDATED_EVENT),
    };

    Ok(([(HX_TRIGGER, trigger)], CartItemsTemplate { cart }).into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, visitor))]
pub async fn count(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
    let count = match state.api().get_cart(&visitor).await {
        Ok(cart) => cart.item_count(),
        Err(e) => {
            tracing::debug!(error = %e, "Cart count unavailable");
            0
        }
    };

    CartCountTemplate { count }
}

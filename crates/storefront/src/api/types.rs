//! Wire types for the Gravis REST backend.
//!
//! Field names follow the backend's snake_case JSON. Collections and
//! free-text fields tolerate both a missing key and an explicit `null`.

use chrono::{DateTime, Utc};
use gravis_core::{
    CategoryFilterId, CategoryId, CustomerId, FilterOptionId, GuestId, ImageId, Price, ProductId,
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` (or a missing key, together with `#[serde(default)]`)
/// as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Image Types
// =============================================================================

/// Stored image reference (`{id, key, url}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: ImageId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    pub url: String,
}

/// Image attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub image_id: Option<ImageId>,
    #[serde(default)]
    pub is_primary: bool,
}

// =============================================================================
// Product Types
// =============================================================================

/// Category summary embedded in a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// A `{label, value}` row on the product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl TechnicalDetail {
    /// Rows where both label and value are blank are not shown.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty() && self.value.trim().is_empty()
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub sale_price_in_paisa: i64,
    #[serde(default)]
    pub sale_price_in_rupee: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: Vec<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub primary_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ProductImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_details: Vec<TechnicalDetail>,
    #[serde(default, alias = "has_pending_enquiry")]
    pub has_pending_inquiry: bool,
}

impl Product {
    /// Sale price.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::from_paisa(self.sale_price_in_paisa)
    }

    /// Crossed-out list price on cards: 1.5x the sale price, rounded to
    /// whole rupees.
    #[must_use]
    pub const fn mrp(&self) -> Price {
        let paisa = self.sale_price_in_paisa.saturating_mul(3).saturating_add(100) / 200;
        Price::from_paisa(paisa.saturating_mul(100))
    }

    /// Best image for cards: the explicit primary image, then the image
    /// flagged primary, then the first image.
    #[must_use]
    pub fn primary_image_url(&self) -> Option<&str> {
        self.primary_image
            .as_ref()
            .or_else(|| {
                self.images
                    .iter()
                    .find(|img| img.is_primary)
                    .and_then(|img| img.image.as_ref())
            })
            .or_else(|| self.images.iter().find_map(|img| img.image.as_ref()))
            .map(|img| img.url.as_str())
    }

    /// Gallery image URLs with the primary image first and duplicates removed.
    #[must_use]
    pub fn gallery_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::with_capacity(self.images.len() + 1);
        let candidates = self
            .primary_image_url()
            .into_iter()
            .chain(
                self.images
                    .iter()
                    .filter_map(|img| img.image.as_ref())
                    .map(|img| img.url.as_str()),
            );
        for url in candidates {
            if !url.is_empty() && !urls.iter().any(|u| u == url) {
                urls.push(url.to_owned());
            }
        }
        urls
    }

    /// Non-blank technical details split into two columns. The left column
    /// takes the larger half.
    #[must_use]
    pub fn technical_detail_columns(&self) -> (Vec<TechnicalDetail>, Vec<TechnicalDetail>) {
        let mut rows: Vec<TechnicalDetail> = self
            .technical_details
            .iter()
            .filter(|row| !row.is_blank())
            .cloned()
            .collect();
        let right = rows.split_off(rows.len().div_ceil(2));
        (rows, right)
    }
}

// =============================================================================
// Category Types
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub image_id: Option<ImageId>,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// Listing banner configured for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBanner {
    pub id: CategoryId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub banner_image: Option<ImageRef>,
}

/// One selectable value of a category filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: FilterOptionId,
    pub category_filter_id: CategoryFilterId,
    pub value: String,
    pub sort_order: Option<f64>,
}

/// A category filter (e.g. "Fuel type") with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub id: CategoryFilterId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Option<String>,
    pub sort_order: Option<f64>,
    pub options: Vec<FilterOption>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// A line in the visitor's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub quantity: u32,
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub product_name: String,
    #[serde(default)]
    pub primary_image: Option<ImageRef>,
    #[serde(default)]
    pub sale_price_in_paisa: i64,
}

impl CartItem {
    /// Price of a single unit.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::from_paisa(self.sale_price_in_paisa)
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// The visitor's cart (`GET /cart`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: i64,
}

impl Cart {
    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current quantity of a product, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }
}

/// Body of `PUT /cart/{product_id}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdateCartRequest {
    pub quantity: u32,
}

/// Response of `PUT /cart/{product_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartResponse {
    #[serde(default)]
    pub guest_id: Option<GuestId>,
    pub product_id: ProductId,
}

// =============================================================================
// Inquiry Types
// =============================================================================

/// Enquiry about a product from a signed-in customer.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInquiryPayload {
    pub product_id: ProductId,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Enquiry about a product from a visitor without an account.
#[derive(Debug, Clone, Serialize)]
pub struct GuestProductInquiryPayload {
    pub product_id: ProductId,
    pub name: String,
    pub phone_number: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Message from the contact page.
#[derive(Debug, Clone, Serialize)]
pub struct ContactInquiryPayload {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub message: String,
}

/// Response of every inquiry endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InquiryResponse {
    #[serde(default)]
    pub inquiry: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

// =============================================================================
// Customer Types
// =============================================================================

/// A storefront customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Name shown in the header and on enquiry buttons.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            &self.full_name
        } else if !self.first_name.trim().is_empty() {
            &self.first_name
        } else {
            &self.email
        }
    }
}

/// Body of `POST /customers/register`.
///
/// Also kept in the session so the verification code can be re-sent.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

impl std::fmt::Debug for RegisterCustomerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCustomerRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterCustomerResponse {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerifyCustomerEmailRequest {
    pub token: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCustomerEmailResponse {
    pub token: SecretString,
    pub customer: Customer,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LoginCustomerRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCustomerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCustomerRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginCustomerResponse {
    pub customer: Customer,
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn image(id: &str, url: &str) -> serde_json::Value {
        json!({"id": id, "key": id, "url": url})
    }

    #[test]
    fn test_product_tolerates_nulls_and_missing_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Diesel Genset 15 kVA",
            "tags": null,
            "points": null,
            "sale_price_in_paisa": 12_500_000
        }))
        .unwrap();

        assert!(product.tags.is_empty());
        assert!(product.images.is_empty());
        assert!(!product.has_pending_inquiry);
        assert_eq!(product.price().display(), "₹1,25,000");
    }

    #[test]
    fn test_mrp_is_one_and_a_half_times_rounded() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Pump",
            "sale_price_in_paisa": 12_345
        }))
        .unwrap();
        // 123.45 * 1.5 = 185.175 -> 185
        assert_eq!(product.mrp().paisa(), 18_500);
    }

    #[test]
    fn test_gallery_puts_primary_first_and_dedupes() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Genset",
            "primary_image": image("i2", "https://cdn/b.png"),
            "images": [
                {"image": image("i1", "https://cdn/a.png"), "image_id": "i1", "is_primary": false},
                {"image": image("i2", "https://cdn/b.png"), "image_id": "i2", "is_primary": true},
                {"image": image("i3", "https://cdn/a.png"), "image_id": "i3", "is_primary": false}
            ]
        }))
        .unwrap();

        assert_eq!(
            product.gallery_urls(),
            vec!["https://cdn/b.png".to_owned(), "https://cdn/a.png".to_owned()]
        );
    }

    #[test]
    fn test_primary_image_falls_back_to_flagged_then_first() {
        let flagged: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Genset",
            "images": [
                {"image": image("i1", "https://cdn/a.png"), "is_primary": false},
                {"image": image("i2", "https://cdn/b.png"), "is_primary": true}
            ]
        }))
        .unwrap();
        assert_eq!(flagged.primary_image_url(), Some("https://cdn/b.png"));

        let unflagged: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Genset",
            "images": [{"image": image("i1", "https://cdn/a.png")}]
        }))
        .unwrap();
        assert_eq!(unflagged.primary_image_url(), Some("https://cdn/a.png"));
    }

    #[test]
    fn test_technical_detail_columns() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Genset",
            "technical_details": [
                {"label": "Rated power", "value": "15 kVA"},
                {"label": " ", "value": ""},
                {"label": "Fuel", "value": "Diesel"},
                {"label": "Phase", "value": "Three"}
            ]
        }))
        .unwrap();

        let (left, right) = product.technical_detail_columns();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].label, "Phase");
    }

    #[test]
    fn test_cart_totals() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [
                {"quantity": 2, "product_id": "p1", "product_name": "A", "sale_price_in_paisa": 150_000},
                {"quantity": 1, "product_id": "p2", "product_name": "B", "sale_price_in_paisa": 99_950}
            ],
            "total": 3
        }))
        .unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Price::from_paisa(399_950));
        assert_eq!(cart.quantity_of(&ProductId::new("p2")), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("p3")), 0);
    }

    #[test]
    fn test_register_request_debug_redacts_password() {
        let request = RegisterCustomerRequest {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            password: "hunter2hunter2".into(),
            phone_number: "9876543210".into(),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_customer_display_name_fallbacks() {
        let customer: Customer = serde_json::from_value(json!({
            "id": "c1",
            "first_name": "Asha",
            "full_name": "",
            "email": "asha@example.com"
        }))
        .unwrap();
        assert_eq!(customer.display_name(), "Asha");
    }
}

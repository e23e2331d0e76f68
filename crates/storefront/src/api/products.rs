//! Product endpoints.

use gravis_core::{CategoryId, FilterOptionId, ProductId};
use tracing::{instrument, warn};

use super::cache::{CacheKey, CacheValue};
use super::client::{ApiClient, Visitor};
use super::types::Product;
use super::ApiError;

/// Products per listing page.
pub const PAGE_SIZE: u32 = 24;

/// Listing filters sent to `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub option_ids: Vec<FilterOptionId>,
}

impl ProductFilter {
    /// Query parameters in backend form. Options repeat `option_id`.
    #[must_use]
    pub fn to_params(&self, offset: u32, limit: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(self.option_ids.len() + 4);
        if let Some(category_id) = &self.category_id {
            params.push(("category_id", category_id.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        for option_id in &self.option_ids {
            params.push(("option_id", option_id.to_string()));
        }
        params.push(("offset", offset.to_string()));
        params.push(("limit", limit.to_string()));
        params
    }
}

/// Offset of the page after one that returned `page_len` items.
///
/// There is no next page unless the last one was full.
#[must_use]
pub const fn next_offset(offset: u32, page_len: usize, limit: u32) -> Option<u32> {
    if limit > 0 && page_len >= limit as usize {
        Some(offset.saturating_add(limit))
    } else {
        None
    }
}

impl ApiClient {
    /// List products matching `filter`.
    ///
    /// A body that is not a JSON array yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, visitor))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        offset: u32,
        limit: u32,
        visitor: &Visitor,
    ) -> Result<Vec<Product>, ApiError> {
        let params = filter.to_params(offset, limit);
        let body: serde_json::Value = self.get("/products", &params, visitor).await?;

        if !body.is_array() {
            warn!("Product listing was not an array");
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Like [`ApiClient::list_products`], but logs failures and returns an
    /// empty list.
    pub async fn list_products_or_empty(
        &self,
        filter: &ProductFilter,
        offset: u32,
        limit: u32,
        visitor: &Visitor,
    ) -> Vec<Product> {
        self.list_products(filter, offset, limit, visitor)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch products");
                Vec::new()
            })
    }

    /// Get a product by id. A 404 yields `None`.
    ///
    /// Anonymous reads are cached; signed-in reads are not, because the
    /// response carries the visitor's pending-enquiry flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, visitor), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        id: &ProductId,
        visitor: &Visitor,
    ) -> Result<Option<Product>, ApiError> {
        let cache_key = CacheKey::Product(id.clone());
        let cacheable = !visitor.is_authenticated();

        if cacheable && let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            return Ok(Some(*product));
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let product: Product = match self.get(&path, &[], visitor).await {
            Ok(product) => product,
            Err(ApiError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        if cacheable {
            self.cache(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(Some(product))
    }
}

//! Category, banner and filter endpoints.
//!
//! The filters endpoint has shipped several response shapes; all of them
//! are normalized into [`CategoryFilter`] by [`normalize_filters`].

use gravis_core::{CategoryFilterId, CategoryId, FilterOptionId};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use super::cache::{CacheKey, CacheValue};
use super::client::{ApiClient, Visitor};
use super::types::{CategoryBanner, CategoryFilter, FilterOption, ProductCategory};
use super::ApiError;

/// Coerce a JSON scalar to its string form. Missing and `null` are empty.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Numeric sort order, fractions included; anything else is dropped.
fn sort_order(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn normalize_option(raw: &Value, filter_id: &str) -> FilterOption {
    let empty = Map::new();
    let opt = raw.as_object().unwrap_or(&empty);
    let category_filter_id = match opt.get("category_filter_id") {
        None | Some(Value::Null) => filter_id.to_string(),
        present => coerce_string(present),
    };

    FilterOption {
        id: FilterOptionId::new(coerce_string(opt.get("id"))),
        category_filter_id: CategoryFilterId::new(category_filter_id),
        value: coerce_string(opt.get("value")),
        sort_order: sort_order(opt.get("sort_order")),
    }
}

fn normalize_filter(f: &Map<String, Value>) -> CategoryFilter {
    let id = coerce_string(f.get("id"));
    let options = f
        .get("options")
        .filter(|v| !v.is_null())
        .or_else(|| f.get("filter_options"))
        .and_then(Value::as_array)
        .map(|raw| raw.iter().map(|opt| normalize_option(opt, &id)).collect())
        .unwrap_or_default();

    CategoryFilter {
        category_id: CategoryId::new(coerce_string(f.get("category_id"))),
        name: coerce_string(f.get("name")),
        slug: f
            .get("slug")
            .filter(|v| !v.is_null())
            .map(|v| coerce_string(Some(v))),
        sort_order: sort_order(f.get("sort_order")),
        options,
        id: CategoryFilterId::new(id),
    }
}

/// Normalize a filters response.
///
/// Accepts a bare array, `{"data": [...]}` or `{"filters": [...]}`.
/// Non-object entries are skipped.
#[must_use]
pub fn normalize_filters(raw: &Value) -> Vec<CategoryFilter> {
    let list = match raw {
        Value::Array(list) => Some(list),
        Value::Object(obj) => obj
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| obj.get("filters").and_then(Value::as_array)),
        _ => None,
    };

    list.map(|list| {
        list.iter()
            .filter_map(Value::as_object)
            .map(normalize_filter)
            .collect()
    })
    .unwrap_or_default()
}

impl ApiClient {
    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<ProductCategory>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cached(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let body: Value = self
            .get("/product-categories", &[], &Visitor::anonymous())
            .await?;
        let categories: Vec<ProductCategory> = if body.is_array() {
            serde_json::from_value(body)?
        } else {
            Vec::new()
        };

        self.cache(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Uncached reachability probe for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or fails.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        let _: Value = self
            .get("/product-categories", &[], &Visitor::anonymous())
            .await?;
        Ok(())
    }

    /// Categories for page chrome; failures are logged and yield `[]`.
    pub async fn list_categories_or_empty(&self) -> Vec<ProductCategory> {
        self.list_categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch categories");
            Vec::new()
        })
    }

    /// List category banners.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_banners(&self) -> Result<Vec<CategoryBanner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.cached(&CacheKey::Banners).await {
            return Ok(banners);
        }

        let body: Value = self
            .get("/product-categories/banners", &[], &Visitor::anonymous())
            .await?;
        let banners: Vec<CategoryBanner> = if body.is_array() {
            serde_json::from_value(body)?
        } else {
            Vec::new()
        };

        self.cache(CacheKey::Banners, CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    /// Banners for the listing page; failures are logged and yield `[]`.
    pub async fn list_banners_or_empty(&self) -> Vec<CategoryBanner> {
        self.list_banners().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch category banners");
            Vec::new()
        })
    }

    /// Filters available for a category. A blank id yields `[]` without a
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn category_filters(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<CategoryFilter>, ApiError> {
        if category_id.as_str().trim().is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::Filters(category_id.clone());
        if let Some(CacheValue::Filters(filters)) = self.cached(&cache_key).await {
            return Ok(filters);
        }

        let path = format!(
            "/product-categories/{}/filters",
            urlencoding::encode(category_id.as_str())
        );
        let body: Value = self.get(&path, &[], &Visitor::anonymous()).await?;
        let filters = normalize_filters(&body);

        self.cache(cache_key, CacheValue::Filters(filters.clone()))
            .await;
        Ok(filters)
    }

    /// Filters for the sidebar; failures are logged and yield `[]`.
    pub async fn category_filters_or_empty(&self, category_id: &CategoryId) -> Vec<CategoryFilter> {
        self.category_filters(category_id).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch category filters");
            Vec::new()
        })
    }
}

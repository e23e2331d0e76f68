//! Cache types for catalog responses.

use gravis_core::{CategoryId, ProductId};

use super::types::{CategoryBanner, CategoryFilter, Product, ProductCategory};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Banners,
    Filters(CategoryId),
    /// Product detail as seen by a visitor without a token.
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<ProductCategory>),
    Banners(Vec<CategoryBanner>),
    Filters(Vec<CategoryFilter>),
    Product(Box<Product>),
}

//! Product listing state carried in the URL.
//!
//! The listing page is fully described by its query string:
//!
//! ```text
//! /products?category_id=<uuid v7>&search=<text>&option_id=<uuid v7>&option_id=...
//! ```
//!
//! `option_ids` is accepted as an alias of `option_id`. Builders always
//! emit the canonical form.

use gravis_core::{CategoryId, FilterOptionId, is_uuid_v7};
use url::form_urlencoded;

use crate::api::ProductFilter;

/// Path of the listing page.
pub const PRODUCTS_PATH: &str = "/products";

/// Parsed listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    filter: ProductFilter,
}

impl CatalogQuery {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// - `category_id`: empty means none; anything but a UUID v7 resets the
    ///   whole query to its defaults
    /// - `search`: trimmed and lower-cased; empty means none
    /// - `option_id` / `option_ids`: blank values are skipped; a single value
    ///   that is not a UUID v7 empties the list
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let mut category: Option<String> = None;
        let mut search: Option<String> = None;
        let mut options: Vec<String> = Vec::new();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "category_id" if category.is_none() => category = Some(value.into_owned()),
                "search" if search.is_none() => search = Some(value.into_owned()),
                "option_id" | "option_ids" if !value.is_empty() => options.push(value.into_owned()),
                _ => {}
            }
        }

        let category_id = match category.filter(|id| !id.is_empty()) {
            None => None,
            Some(id) if is_uuid_v7(&id) => Some(CategoryId::new(id)),
            Some(id) => {
                tracing::debug!(category_id = %id, "Invalid category id, resetting listing query");
                return Self::default();
            }
        };

        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let option_ids = if options.iter().all(|id| is_uuid_v7(id)) {
            options.into_iter().map(FilterOptionId::new).collect()
        } else {
            Vec::new()
        };

        Self {
            filter: ProductFilter {
                category_id,
                search,
                option_ids,
            },
        }
    }

    /// Filters to send to the backend.
    #[must_use]
    pub const fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<&CategoryId> {
        self.filter.category_id.as_ref()
    }

    /// Search text, empty when none.
    #[must_use]
    pub fn search(&self) -> &str {
        self.filter.search.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn option_ids(&self) -> &[FilterOptionId] {
        &self.filter.option_ids
    }

    #[must_use]
    pub fn is_option_selected(&self, id: &FilterOptionId) -> bool {
        self.filter.option_ids.contains(id)
    }

    #[must_use]
    pub fn is_category_selected(&self, id: &CategoryId) -> bool {
        self.filter.category_id.as_ref() == Some(id)
    }

    /// Whether any filter option is selected.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.filter.option_ids.is_empty()
    }

    /// Canonical query string, empty when nothing is set.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(category_id) = &self.filter.category_id {
            serializer.append_pair("category_id", category_id.as_str());
        }
        if let Some(search) = &self.filter.search {
            serializer.append_pair("search", search);
        }
        for option_id in &self.filter.option_ids {
            serializer.append_pair("option_id", option_id.as_str());
        }
        serializer.finish()
    }

    /// Listing URL for this query.
    #[must_use]
    pub fn url(&self) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            PRODUCTS_PATH.to_string()
        } else {
            format!("{PRODUCTS_PATH}?{query}")
        }
    }

    /// Infinite-scroll URL for the page starting at `offset`.
    #[must_use]
    pub fn more_url(&self, offset: u32) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            format!("{PRODUCTS_PATH}/more?offset={offset}")
        } else {
            format!("{PRODUCTS_PATH}/more?{query}&offset={offset}")
        }
    }

    /// Switch category. Selected options belong to the old category and
    /// are dropped; the search is kept.
    #[must_use]
    pub fn with_category(&self, category_id: Option<&CategoryId>) -> Self {
        Self {
            filter: ProductFilter {
                category_id: category_id.cloned(),
                search: self.filter.search.clone(),
                option_ids: Vec::new(),
            },
        }
    }

    /// Select `option_id`, or deselect it if already selected.
    #[must_use]
    pub fn toggle_option(&self, option_id: &FilterOptionId) -> Self {
        let mut next = self.clone();
        if let Some(pos) = next.filter.option_ids.iter().position(|id| id == option_id) {
            next.filter.option_ids.remove(pos);
        } else {
            next.filter.option_ids.push(option_id.clone());
        }
        next
    }

    /// Drop every selected option, keeping category and search.
    #[must_use]
    pub fn without_options(&self) -> Self {
        let mut next = self.clone();
        next.filter.option_ids.clear();
        next
    }

    /// Replace the search text.
    #[must_use]
    pub fn with_search(&self, search: &str) -> Self {
        let mut next = self.clone();
        let search = search.trim().to_lowercase();
        next.filter.search = (!search.is_empty()).then_some(search);
        next
    }
}

/// Listing URL filtered to one category.
#[must_use]
pub fn category_url(category_id: &CategoryId) -> String {
    CatalogQuery::default().with_category(Some(category_id)).url()
}

//! Product route handlers.
//!
//! The listing page is driven entirely by its query string (see
//! [`CatalogQuery`]). HTMX requests targeting `#catalog` get just the
//! catalog fragment; `/products/more` serves the next page of cards for infinite
//! scroll.

use std::cmp::Ordering;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, RawQuery, State},
    response::{IntoResponse, Response},
};
use gravis_core::{CategoryId, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::api::products::{PAGE_SIZE, next_offset};
use crate::api::{CategoryBanner, CategoryFilter, Product, ProductCategory, TechnicalDetail, Visitor};
use crate::catalog::{CatalogQuery, category_url};
use crate::error::{AppError, Result};
use crate::filters;
use crate::htmx::HxTarget;
use crate::layout::Layout;
use crate::middleware::OptionalAuth;
use crate::routes::enquiry::EnquiryWidget;
use crate::state::AppState;

/// Banner shown when the selected category has none of its own.
pub const DEFAULT_BANNER_URL: &str = "/static/images/pages/home/hero-banner-1.svg";
const DEFAULT_BANNER_ALT: &str = "Gravis promotional banner";

/// Element id of the swappable catalog region.
pub const CATALOG_ID: &str = "catalog";

/// Bullet points shown on a card.
const CARD_POINTS: usize = 3;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for cards.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub price: String,
    pub mrp: String,
    pub points: Vec<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            url: format!("/products/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            image_url: product.primary_image_url().map(String::from),
            price: product.price().display(),
            mrp: product.mrp().display(),
            points: product.points.iter().take(CARD_POINTS).cloned().collect(),
        }
    }
}

/// Listing hero banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingBanner {
    pub url: String,
    pub alt: String,
}

/// Pick the banner for the selected category, falling back to the default.
#[must_use]
pub fn listing_banner(banners: &[CategoryBanner], category_id: Option<&CategoryId>) -> ListingBanner {
    category_id
        .and_then(|id| banners.iter().find(|b| &b.id == id))
        .and_then(|banner| {
            let image = banner.banner_image.as_ref().filter(|img| !img.url.is_empty())?;
            Some(ListingBanner {
                url: image.url.clone(),
                alt: banner
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "Category banner".to_string()),
            })
        })
        .unwrap_or_else(|| ListingBanner {
            url: DEFAULT_BANNER_URL.to_string(),
            alt: DEFAULT_BANNER_ALT.to_string(),
        })
}

/// Entry in the category select.
#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: String,
    pub name: String,
    pub url: String,
    pub selected: bool,
}

/// A selectable filter value.
#[derive(Debug, Clone)]
pub struct FilterChoice {
    pub value: String,
    pub url: String,
    pub selected: bool,
}

/// A filter with its values, in display order.
#[derive(Debug, Clone)]
pub struct FilterGroup {
    pub name: String,
    pub choices: Vec<FilterChoice>,
}

/// Lower `sort_order` first; entries without one go last.
fn by_sort_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY)
        .total_cmp(&b.unwrap_or(f64::INFINITY))
}

fn filter_groups(query: &CatalogQuery, filters: &[CategoryFilter]) -> Vec<FilterGroup> {
    let mut filters: Vec<&CategoryFilter> = filters.iter().collect();
    filters.sort_by(|a, b| by_sort_order(a.sort_order, b.sort_order));

    filters
        .into_iter()
        .map(|filter| {
            let mut options: Vec<_> = filter.options.iter().collect();
            options.sort_by(|a, b| by_sort_order(a.sort_order, b.sort_order));
            FilterGroup {
                name: filter.name.clone(),
                choices: options
                    .into_iter()
                    .map(|option| FilterChoice {
                        value: option.value.clone(),
                        url: query.toggle_option(&option.id).url(),
                        selected: query.is_option_selected(&option.id),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Everything inside `#catalog`: sidebar and results.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub search: String,
    /// Listing URL with the search text removed.
    pub clear_search_url: String,
    /// Carried as hidden fields by the search form.
    pub category_id: Option<String>,
    pub option_ids: Vec<String>,
    pub category_selected: bool,
    pub all_categories_url: String,
    pub categories: Vec<CategoryChoice>,
    pub filters: Vec<FilterGroup>,
    pub selected_count: usize,
    pub has_filters: bool,
    pub clear_url: String,
    pub products: Vec<ProductCard>,
    pub more_url: Option<String>,
}

impl Catalog {
    fn build(
        query: &CatalogQuery,
        categories: &[ProductCategory],
        filters: &[CategoryFilter],
        products: &[Product],
    ) -> Self {
        Self {
            search: query.search().to_string(),
            clear_search_url: query.with_search("").url(),
            category_id: query.category_id().map(ToString::to_string),
            option_ids: query.option_ids().iter().map(ToString::to_string).collect(),
            category_selected: query.category_id().is_some(),
            all_categories_url: query.with_category(None).url(),
            categories: categories
                .iter()
                .map(|c| CategoryChoice {
                    id: c.id.to_string(),
                    name: c.name.clone(),
                    url: query.with_category(Some(&c.id)).url(),
                    selected: query.is_category_selected(&c.id),
                })
                .collect(),
            filters: filter_groups(query, filters),
            selected_count: query.option_ids().len(),
            has_filters: query.has_active_filters(),
            clear_url: query.without_options().url(),
            products: products.iter().map(ProductCard::from).collect(),
            more_url: next_offset(0, products.len(), PAGE_SIZE).map(|o| query.more_url(o)),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub banner: ListingBanner,
    pub catalog: Catalog,
}

/// Catalog fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "products/catalog.html")]
pub struct CatalogTemplate {
    pub catalog: Catalog,
}

/// Next page of cards (for HTMX infinite scroll).
#[derive(Template, WebTemplate)]
#[template(path = "products/more.html")]
pub struct MoreProductsTemplate {
    pub products: Vec<ProductCard>,
    pub more_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: Product,
    pub price: String,
    pub category_url: Option<String>,
    pub gallery: Vec<String>,
    pub specs_left: Vec<TechnicalDetail>,
    pub specs_right: Vec<TechnicalDetail>,
    pub enquiry: EnquiryWidget,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing page.
///
/// Side panels (categories, banners, filters) degrade to empty when the
/// backend fails; the product list does too, showing the empty state.
#[instrument(skip(state, layout, visitor))]
pub async fn index(
    State(state): State<AppState>,
    target: HxTarget,
    visitor: Visitor,
    layout: Layout,
    RawQuery(raw): RawQuery,
) -> Response {
    let query = CatalogQuery::parse(raw.as_deref());
    let api = state.api();

    let (products, banners, filters) = tokio::join!(
        api.list_products_or_empty(query.filter(), 0, PAGE_SIZE, &visitor),
        api.list_banners_or_empty(),
        async {
            match query.category_id() {
                Some(id) => api.category_filters_or_empty(id).await,
                None => Vec::new(),
            }
        },
    );
    let categories = api.list_categories_or_empty().await;

    let catalog = Catalog::build(&query, &categories, &filters, &products);

    if target.is(CATALOG_ID) {
        return CatalogTemplate { catalog }.into_response();
    }

    ProductsIndexTemplate {
        banner: listing_banner(&banners, query.category_id()),
        layout,
        catalog,
    }
    .into_response()
}

/// Offset of the requested page.
#[derive(Debug, Deserialize)]
pub struct MoreQuery {
    #[serde(default)]
    pub offset: u32,
}

/// Next page of product cards (HTMX).
#[instrument(skip(state, visitor))]
pub async fn more(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(page): Query<MoreQuery>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let query = CatalogQuery::parse(raw.as_deref());
    let products = state
        .api()
        .list_products_or_empty(query.filter(), page.offset, PAGE_SIZE, &visitor)
        .await;

    MoreProductsTemplate {
        more_url: next_offset(page.offset, products.len(), PAGE_SIZE).map(|o| query.more_url(o)),
        products: products.iter().map(ProductCard::from).collect(),
    }
}

/// Query flags on the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    #[serde(default)]
    pub open_enquiry: Option<String>,
}

/// Display the product detail page.
#[instrument(skip(state, layout, visitor, customer))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(flags): Query<ShowQuery>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
    layout: Layout,
) -> Result<Response> {
    let id = ProductId::new(id);
    let product = state
        .api()
        .get_product(&id, &visitor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let logged_in = customer.is_some();
    let enquiry = EnquiryWidget::new(
        &product,
        logged_in,
        flags.open_enquiry.as_deref() == Some("true"),
    );
    let (specs_left, specs_right) = product.technical_detail_columns();

    Ok(ProductShowTemplate {
        layout,
        price: product.price().display(),
        category_url: product.category.as_ref().map(|c| category_url(&c.id)),
        gallery: product.gallery_urls(),
        specs_left,
        specs_right,
        enquiry,
        product,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gravis_core::FilterOptionId;
    use serde_json::json;

    use super::*;
    use crate::api::{FilterOption, ImageRef};

    const CAT: &str = "0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f";

    fn banner(id: &str, name: Option<&str>, url: Option<&str>) -> CategoryBanner {
        CategoryBanner {
            id: CategoryId::new(id),
            name: name.map(String::from),
            banner_image: url.map(|u| ImageRef {
                id: "img".into(),
                key: "img".to_string(),
                url: u.to_string(),
            }),
        }
    }

    #[test]
    fn test_listing_banner_prefers_category_banner() {
        let banners = vec![banner(CAT, Some("Diesel Gensets"), Some("https://files/diesel.png"))];
        let chosen = listing_banner(&banners, Some(&CategoryId::new(CAT)));
        assert_eq!(chosen.url, "https://files/diesel.png");
        assert_eq!(chosen.alt, "Diesel Gensets");
    }

    #[test]
    fn test_listing_banner_fallbacks() {
        let banners = vec![
            banner(CAT, None, Some("https://files/diesel.png")),
            banner("other", Some("Solar"), None),
        ];
        assert_eq!(
            listing_banner(&banners, Some(&CategoryId::new(CAT))).alt,
            "Category banner"
        );
        assert_eq!(
            listing_banner(&banners, Some(&CategoryId::new("other"))).url,
            DEFAULT_BANNER_URL
        );
        assert_eq!(listing_banner(&banners, None).alt, DEFAULT_BANNER_ALT);
    }

    #[test]
    fn test_card_limits_points_and_shows_mrp() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Genset",
            "sale_price_in_paisa": 10_000_000,
            "points": ["a", "b", "c", "d"]
        }))
        .unwrap();
        let card = ProductCard::from(&product);
        assert_eq!(card.points.len(), 3);
        assert_eq!(card.price, "₹1,00,000");
        assert_eq!(card.mrp, "₹1,50,000");
        assert_eq!(card.url, "/products/p1");
    }

    #[test]
    fn test_filter_groups_sorted_with_toggle_urls() {
        let opt = "0190b2a4-7c1e-7a3d-9f00-000000000001";
        let query = CatalogQuery::parse(Some(format!("category_id={CAT}&option_id={opt}").as_str()));
        let filters = vec![
            CategoryFilter {
                id: "f2".into(),
                category_id: CategoryId::new(CAT),
                name: "Phase".to_string(),
                slug: None,
                sort_order: Some(2.0),
                options: Vec::new(),
            },
            CategoryFilter {
                id: "f1".into(),
                category_id: CategoryId::new(CAT),
                name: "Fuel".to_string(),
                slug: None,
                sort_order: Some(1.0),
                options: vec![FilterOption {
                    id: FilterOptionId::new(opt),
                    category_filter_id: "f1".into(),
                    value: "Diesel".to_string(),
                    sort_order: None,
                }],
            },
        ];

        let groups = filter_groups(&query, &filters);
        assert_eq!(groups[0].name, "Fuel");
        let choice = &groups[0].choices[0];
        assert!(choice.selected);
        assert_eq!(choice.url, format!("/products?category_id={CAT}"));
    }

    #[test]
    fn test_filter_groups_order_fractional_sort_order() {
        let filter = |id: &str, name: &str, sort_order: Option<f64>| CategoryFilter {
            id: id.into(),
            category_id: CategoryId::new(CAT),
            name: name.to_string(),
            slug: None,
            sort_order,
            options: Vec::new(),
        };
        let filters = vec![
            filter("f1", "Unordered", None),
            filter("f2", "Phase", Some(2.0)),
            filter("f3", "Rating", Some(1.5)),
            filter("f4", "Fuel", Some(1.0)),
        ];

        let names: Vec<_> = filter_groups(&CatalogQuery::default(), &filters)
            .into_iter()
            .map(|group| group.name)
            .collect();
        assert_eq!(names, ["Fuel", "Rating", "Phase", "Unordered"]);
    }

    #[test]
    fn test_catalog_more_url_only_after_full_page() {
        let query = CatalogQuery::default();
        let catalog = Catalog::build(&query, &[], &[], &[]);
        assert!(catalog.more_url.is_none());
        assert!(!catalog.category_selected);
        assert!(!catalog.has_filters);
        assert_eq!(catalog.clear_url, "/products");
    }

    #[test]
    fn test_catalog_search_form_keeps_selection() {
        let opt = "0190b2a4-7c1e-7a3d-9f00-000000000001";
        let query = CatalogQuery::parse(Some(
            format!("category_id={CAT}&search=Silent&option_id={opt}").as_str(),
        ));
        let catalog = Catalog::build(&query, &[], &[], &[]);
        assert_eq!(catalog.search, "silent");
        assert_eq!(catalog.category_id.as_deref(), Some(CAT));
        assert_eq!(catalog.option_ids, vec![opt.to_string()]);
        assert!(catalog.has_filters);
        assert_eq!(
            catalog.clear_search_url,
            format!("/products?category_id={CAT}&option_id={opt}")
        );
    }
}

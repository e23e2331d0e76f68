//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::{ProductFilter, Visitor};
use crate::api::products::PAGE_SIZE;
use crate::filters;
use crate::layout::{Layout, NavCategory};
use crate::routes::products::ProductCard;
use crate::state::AppState;

// =============================================================================
// Static Content
// =============================================================================

/// A hero carousel slide.
#[derive(Debug, Clone, Copy)]
pub struct HeroSlide {
    pub image_path: &'static str,
    pub image_alt: &'static str,
}

pub const HERO_SLIDES: &[HeroSlide] = &[
    HeroSlide {
        image_path: "/static/images/pages/home/hero-banner-1.svg",
        image_alt: "Gravis generators for every need",
    },
    HeroSlide {
        image_path: "/static/images/pages/home/hero-banner-2.svg",
        image_alt: "Reliable power from Gravis",
    },
];

/// A headline figure in the about section.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub value: &'static str,
    pub label: &'static str,
}

pub const ABOUT_STATS: &[Stat] = &[
    Stat {
        value: "20+",
        label: "Years of Excellence",
    },
    Stat {
        value: "5M+",
        label: "Happy Customers",
    },
    Stat {
        value: "500+",
        label: "Service Centers",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub slides: &'static [HeroSlide],
    pub categories: Vec<NavCategory>,
    pub popular_products: Vec<ProductCard>,
    pub stats: &'static [Stat],
}

/// Display the home page.
///
/// Categories come from the layout's cached list; popular products are the
/// first listing page. Either section shows its empty state on failure.
#[instrument(skip(state, visitor, layout))]
pub async fn home(
    State(state): State<AppState>,
    visitor: Visitor,
    layout: Layout,
) -> impl IntoResponse {
    let products = state
        .api()
        .list_products_or_empty(&ProductFilter::default(), 0, PAGE_SIZE, &visitor)
        .await;

    HomeTemplate {
        categories: layout.categories.clone(),
        layout,
        slides: HERO_SLIDES,
        popular_products: products.iter().map(ProductCard::from).collect(),
        stats: ABOUT_STATS,
    }
}

//! Static content page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::layout::Layout;
use crate::routes::home::{ABOUT_STATS, Stat};

/// A company value on the about page.
#[derive(Debug, Clone, Copy)]
pub struct CoreValue {
    pub title: &'static str,
    pub description: &'static str,
}

pub const CORE_VALUES: &[CoreValue] = &[
    CoreValue {
        title: "Self Reliance",
        description: "We empower people to take ownership of their work and growth, building confidence and capability.",
    },
    CoreValue {
        title: "Hard Work",
        description: "We value the dedication and discipline required to deliver excellence in everything we do.",
    },
    CoreValue {
        title: "Innovation",
        description: "We embrace new ideas and technologies while protecting the environment for future generations.",
    },
    CoreValue {
        title: "Collaboration",
        description: "We foster a culture of teamwork, communication, and mutual respect to achieve shared goals.",
    },
];

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
    pub stats: &'static [Stat],
    pub values: &'static [CoreValue],
}

/// Display the about page.
#[instrument(skip(layout))]
pub async fn about(layout: Layout) -> impl IntoResponse {
    AboutTemplate {
        layout,
        stats: ABOUT_STATS,
        values: CORE_VALUES,
    }
}

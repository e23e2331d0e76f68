//! Contact page and contact enquiry handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::Visitor;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::forms::{ContactForm, ValidationErrors};
use crate::htmx::HX_TRIGGER;
use crate::layout::Layout;
use crate::models::Toast;
use crate::state::AppState;

/// A Gravis office shown on the contact page.
#[derive(Debug, Clone, Copy)]
pub struct Office {
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub hours: &'static str,
}

impl Office {
    /// `tel:` link for the office phone.
    #[must_use]
    pub fn tel_href(&self) -> String {
        format!("tel:{}", self.phone.replace(' ', ""))
    }

    /// Map embed for the office address.
    ///
    /// Uses the Maps Embed API when a key is configured, otherwise the
    /// keyless search embed.
    #[must_use]
    pub fn map_url(&self, api_key: Option<&str>) -> String {
        let query = urlencoding::encode(self.address);
        match api_key {
            Some(key) => format!(
                "https://www.google.com/maps/embed/v1/place?key={}&q={query}",
                urlencoding::encode(key)
            ),
            None => format!("https://www.google.com/maps?q={query}&output=embed"),
        }
    }
}

pub const HEAD_OFFICE: Office = Office {
    name: "Head Office",
    address: "123 Industrial Area, Phase 2, Sector 18, Gurugram, Haryana 122015",
    phone: "+91 98765 43210",
    email: "hello@gravis.com",
    hours: "Mon - Sat: 9:00 AM - 6:00 PM",
};

pub const MUMBAI_OFFICE: Office = Office {
    name: "Branch - Mumbai",
    address: "45 Trade Center, Andheri East, Mumbai, Maharashtra 400069",
    phone: "+91 98765 43211",
    email: "mumbai@gravis.com",
    hours: "Mon - Fri: 10:00 AM - 7:00 PM",
};

pub const OFFICES: &[Office] = &[HEAD_OFFICE, MUMBAI_OFFICE];

/// Office with its rendered map URL.
#[derive(Debug, Clone)]
pub struct OfficeView {
    pub office: Office,
    pub map_url: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub head_office: Office,
    pub offices: Vec<OfficeView>,
    pub form: ContactForm,
    pub errors: ValidationErrors,
}

/// Contact form fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "contact_form.html")]
pub struct ContactFormTemplate {
    pub form: ContactForm,
    pub errors: ValidationErrors,
}

/// Shown in place of the form once the message is sent.
#[derive(Template, WebTemplate)]
#[template(path = "contact_sent.html")]
pub struct ContactSentTemplate;

// =============================================================================
// Handlers
// =============================================================================

/// Display the contact page.
#[instrument(skip(state, layout))]
pub async fn show(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let api_key = state.config().google_maps_api_key.as_deref();
    ContactTemplate {
        layout,
        head_office: HEAD_OFFICE,
        offices: OFFICES
            .iter()
            .map(|office| OfficeView {
                office: *office,
                map_url: office.map_url(api_key),
            })
            .collect(),
        form: ContactForm::default(),
        errors: ValidationErrors::default(),
    }
}

/// Handle the contact form (HTMX).
#[instrument(skip(state, visitor, form))]
pub async fn submit(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ContactForm>,
) -> Response {
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => {
            return (StatusCode::BAD_REQUEST, ContactFormTemplate { form, errors }).into_response();
        }
    };

    match state.api().submit_contact_inquiry(&payload, &visitor).await {
        Ok(_) => {
            add_breadcrumb("enquiry", "Contact enquiry submitted", None);
            ContactSentTemplate.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Contact enquiry failed");
            let toast = Toast::error(e.user_message("Failed to send message. Please try again."));
            (
                [(HX_TRIGGER, toast.hx_trigger(&[]))],
                ContactFormTemplate {
                    form,
                    errors: ValidationErrors::default(),
                },
            )
                .into_response()
        }
    }
}

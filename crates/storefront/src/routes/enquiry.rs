//! Product enquiry handlers.
//!
//! Signed-in customers get an "Enquire now" dialog whose button flips to a
//! pending state once submitted. Visitors without an account can use the
//! guest "Add Enquiry" dialog, which only needs a name and a phone number.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use gravis_core::ProductId;
use tracing::instrument;

use crate::api::{ApiError, Product, Visitor};
use crate::error::{Result, add_breadcrumb};
use crate::forms::{GuestEnquiryForm, ProductEnquiryForm, ValidationErrors};
use crate::htmx::{HX_RESWAP, HX_RETARGET, HX_TRIGGER};
use crate::middleware::{RequireAuth, login_url};
use crate::models::Toast;
use crate::state::AppState;

const SUBMITTED_MESSAGE: &str = "Your enquiry has been submitted. We'll get back to you soon.";
const FAILED_MESSAGE: &str = "Failed to submit enquiry. Please try again.";

/// Label of the enquiry button.
///
/// Pending only counts for signed-in visitors; callers pass `false`
/// otherwise.
#[must_use]
pub fn enquiry_label(pending: bool, product_name: &str) -> String {
    match (pending, product_name.trim()) {
        (true, "") => "Enquiry pending".to_string(),
        (true, name) => format!("Enquiry pending for {name}"),
        (false, _) => "Enquire now".to_string(),
    }
}

/// The enquiry buttons and dialogs on the product page.
#[derive(Debug, Clone)]
pub struct EnquiryWidget {
    pub product_id: String,
    pub product_name: String,
    pub logged_in: bool,
    pub pending: bool,
    /// Open the dialog on load (returning from login).
    pub auto_open: bool,
    pub login_href: String,
    /// Always empty; the forms render without messages initially.
    pub errors: ValidationErrors,
}

impl EnquiryWidget {
    #[must_use]
    pub fn new(product: &Product, logged_in: bool, open_requested: bool) -> Self {
        let mut widget =
            Self::for_product(&product.id, &product.name, logged_in, product.has_pending_inquiry);
        widget.auto_open = open_requested && widget.logged_in && !widget.pending;
        widget
    }

    fn for_product(id: &ProductId, name: &str, logged_in: bool, pending: bool) -> Self {
        let page = format!("/products/{}", urlencoding::encode(id.as_str()));
        Self {
            product_id: id.to_string(),
            product_name: name.trim().to_string(),
            logged_in,
            pending: pending && logged_in,
            auto_open: false,
            login_href: login_url(&page),
            errors: ValidationErrors::default(),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        enquiry_label(self.pending, &self.product_name)
    }

    #[must_use]
    pub fn dialog_title(&self) -> String {
        if self.product_name.is_empty() {
            "Product enquiry".to_string()
        } else {
            format!("Enquire about {}", self.product_name)
        }
    }

    #[must_use]
    pub fn enquiry_url(&self) -> String {
        format!("/products/{}/enquiry", urlencoding::encode(&self.product_id))
    }

    #[must_use]
    pub fn guest_enquiry_url(&self) -> String {
        format!("/products/{}/guest-enquiry", urlencoding::encode(&self.product_id))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Whole widget, swapped in after a successful enquiry.
#[derive(Template, WebTemplate)]
#[template(path = "enquiry/widget.html")]
pub struct EnquiryWidgetTemplate {
    pub widget: EnquiryWidget,
}

/// Signed-in enquiry form with inline errors.
#[derive(Template, WebTemplate)]
#[template(path = "enquiry/product_form.html")]
pub struct ProductFormTemplate {
    pub widget: EnquiryWidget,
    pub form: ProductEnquiryForm,
    pub errors: ValidationErrors,
}

/// Guest enquiry form with inline errors.
#[derive(Template, WebTemplate)]
#[template(path = "enquiry/guest_form.html")]
pub struct GuestFormTemplate {
    pub widget: EnquiryWidget,
    pub form: GuestEnquiryForm,
    pub errors: ValidationErrors,
}

/// Replaces the guest form once the enquiry is sent.
#[derive(Template, WebTemplate)]
#[template(path = "enquiry/guest_sent.html")]
pub struct GuestSentTemplate;

fn with_toast(toast: &Toast, body: impl IntoResponse) -> Response {
    ([(HX_TRIGGER, toast.hx_trigger(&[]))], body).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Submit an enquiry as the signed-in customer.
#[instrument(skip(state, customer, visitor, form), fields(product_id = %id))]
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequireAuth(customer): RequireAuth,
    visitor: Visitor,
    Form(form): Form<ProductEnquiryForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);
    let widget = EnquiryWidget::for_product(&product_id, &form.product_name, true, false);

    let payload = match form.validate(&product_id) {
        Ok(payload) => payload,
        Err(errors) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ProductFormTemplate {
                    widget,
                    form,
                    errors,
                },
            )
                .into_response());
        }
    };

    match state.api().submit_product_inquiry(&payload, &visitor).await {
        Ok(_) => {
            add_breadcrumb(
                "enquiry",
                "Product enquiry submitted",
                Some(&[
                    ("product_id", product_id.as_str()),
                    ("customer_id", customer.customer.id.as_str()),
                ]),
            );
            let widget = EnquiryWidget {
                pending: true,
                ..widget
            };
            Ok((
                [
                    (HX_RETARGET, HeaderValue::from_static("#enquiry-widget")),
                    (HX_RESWAP, HeaderValue::from_static("outerHTML")),
                    (HX_TRIGGER, Toast::success(SUBMITTED_MESSAGE).hx_trigger(&[])),
                ],
                EnquiryWidgetTemplate { widget },
            )
                .into_response())
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Product enquiry failed");
            let toast = Toast::error(e.user_message(FAILED_MESSAGE));
            Ok(with_toast(
                &toast,
                ProductFormTemplate {
                    widget,
                    form,
                    errors: ValidationErrors::default(),
                },
            ))
        }
    }
}

/// Submit an enquiry without an account.
#[instrument(skip(state, visitor, form), fields(product_id = %id))]
pub async fn submit_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    visitor: Visitor,
    Form(form): Form<GuestEnquiryForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);
    let widget = EnquiryWidget::for_product(&product_id, &form.product_name, false, false);

    let payload = match form.validate(&product_id) {
        Ok(payload) => payload,
        Err(errors) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                GuestFormTemplate {
                    widget,
                    form,
                    errors,
                },
            )
                .into_response());
        }
    };

    match state
        .api()
        .submit_guest_product_inquiry(&payload, &visitor)
        .await
    {
        Ok(_) => {
            add_breadcrumb(
                "enquiry",
                "Guest enquiry submitted",
                Some(&[("product_id", product_id.as_str())]),
            );
            Ok(GuestSentTemplate.into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Guest enquiry failed");
            Ok(with_toast(
                &Toast::error(FAILED_MESSAGE),
                GuestFormTemplate {
                    widget,
                    form,
                    errors: ValidationErrors::default(),
                },
            ))
        }
    }
}

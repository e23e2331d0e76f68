//! Authentication route handlers.
//!
//! Handles login, registration and email verification against the Gravis
//! customer endpoints. Forms post back to themselves; failures re-render
//! the page with inline messages, successes redirect with a flash toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, RegisterCustomerRequest};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{
    LoginForm, RegisterForm, ValidationErrors, VerifyEmailForm, post_auth_redirect, safe_redirect,
};
use crate::layout::Layout;
use crate::middleware::auth::{
    clear_pending_registration, pending_registration, set_pending_registration,
};
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, Toast, set_flash};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const VERIFICATION_FAILED: &str = "Verification failed. Please try again.";

/// Verification page for a registration token.
fn verify_url(token: &SecretString, redirect_url: &str) -> String {
    format!(
        "/verify-email?token={}&redirect_url={}",
        urlencoding::encode(token.expose_secret()),
        urlencoding::encode(redirect_url)
    )
}

/// Backend message for the inline error banner.
fn inline_error(error: &ApiError, fallback: &str) -> String {
    if error.is_server_error() {
        tracing::error!(error = %error, "Customer endpoint failed");
    } else {
        tracing::info!(error = %error, "Customer endpoint rejected request");
    }
    error.user_message(fallback)
}

// =============================================================================
// Query Types
// =============================================================================

/// `redirect_url` carried through the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Query of the verification page.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
    pub redirect_url: Option<String>,
}

/// Resend form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResendForm {
    pub token: String,
    pub redirect_url: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub redirect_url: String,
    pub register_href: String,
    pub errors: ValidationErrors,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub form: RegisterForm,
    pub redirect_url: String,
    pub login_href: String,
    pub errors: ValidationErrors,
    pub error: Option<String>,
}

/// Email verification page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_email.html")]
pub struct VerifyEmailTemplate {
    pub layout: Layout,
    pub token: String,
    pub redirect_url: String,
    /// Address the code was sent to, when the registration is remembered.
    pub email: Option<String>,
    pub errors: ValidationErrors,
    pub error: Option<String>,
}

fn with_redirect(path: &str, redirect_url: &str) -> String {
    if redirect_url == "/" {
        path.to_string()
    } else {
        format!("{path}?redirect_url={}", urlencoding::encode(redirect_url))
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Visitors who are already signed in go straight to `redirect_url`.
#[instrument(skip(customer, layout))]
pub async fn login_page(
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<RedirectQuery>,
    layout: Layout,
) -> Response {
    let redirect_url = safe_redirect(query.redirect_url.as_deref());
    if customer.is_some() {
        return Redirect::to(&redirect_url).into_response();
    }

    LoginTemplate {
        layout,
        email: String::new(),
        register_href: with_redirect("/register", &redirect_url),
        redirect_url,
        errors: ValidationErrors::default(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, layout, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let redirect_url = safe_redirect(form.redirect_url.as_deref());
    let page = |errors: ValidationErrors, error: Option<String>| LoginTemplate {
        layout,
        email: form.email.trim().to_string(),
        register_href: with_redirect("/register", &redirect_url),
        redirect_url: redirect_url.clone(),
        errors,
        error,
    };

    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => return Ok((StatusCode::BAD_REQUEST, page(errors, None)).into_response()),
    };

    match state.api().login_customer(&request).await {
        Ok(response) => {
            let current =
                CurrentCustomer::new(response.customer, &response.token, response.expires_at);
            set_current_customer(&session, &current).await?;
            set_sentry_user(&current.customer.id, Some(&current.customer.email));
            add_breadcrumb("auth", "Customer signed in", None);
            set_flash(&session, Toast::success("Signed in successfully.")).await;

            Ok(Redirect::to(&post_auth_redirect(form.redirect_url.as_deref())).into_response())
        }
        Err(e) => {
            let message = inline_error(&e, LOGIN_FAILED);
            Ok((StatusCode::BAD_REQUEST, page(ValidationErrors::default(), Some(message)))
                .into_response())
        }
    }
}

/// Sign out and return home. The guest cart survives.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    add_breadcrumb("auth", "Customer signed out", None);
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(layout))]
pub async fn register_page(Query(query): Query<RedirectQuery>, layout: Layout) -> impl IntoResponse {
    let redirect_url = safe_redirect(query.redirect_url.as_deref());
    RegisterTemplate {
        layout,
        form: RegisterForm::default(),
        login_href: with_redirect("/login", &redirect_url),
        redirect_url,
        errors: ValidationErrors::default(),
        error: None,
    }
}

/// Handle registration form submission.
///
/// The backend emails a one-time code; the registration is remembered in
/// the session so the code can be re-sent from the verification page.
#[instrument(skip(state, session, layout, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let redirect_url = safe_redirect(form.redirect_url.as_deref());
    let page = |errors: ValidationErrors, error: Option<String>| RegisterTemplate {
        layout,
        form: form.without_password(),
        login_href: with_redirect("/login", &redirect_url),
        redirect_url: redirect_url.clone(),
        errors,
        error,
    };

    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => return Ok((StatusCode::BAD_REQUEST, page(errors, None)).into_response()),
    };

    match state.api().register_customer(&request).await {
        Ok(response) => {
            set_pending_registration(&session, &request).await?;
            add_breadcrumb("auth", "Customer registered", None);
            set_flash(
                &session,
                Toast::success("Account created! Verify your email to finish signing in."),
            )
            .await;

            Ok(Redirect::to(&verify_url(&response.token, &redirect_url)).into_response())
        }
        Err(e) => {
            let message = inline_error(&e, REGISTRATION_FAILED);
            Ok((StatusCode::BAD_REQUEST, page(ValidationErrors::default(), Some(message)))
                .into_response())
        }
    }
}

// =============================================================================
// Verification Routes
// =============================================================================

async fn pending_email(session: &Session) -> Option<String> {
    pending_registration(session)
        .await
        .map(|registration: RegisterCustomerRequest| registration.email)
}

/// Display the verification page.
#[instrument(skip(session, layout, query))]
pub async fn verify_email_page(
    session: Session,
    Query(query): Query<VerifyQuery>,
    layout: Layout,
) -> impl IntoResponse {
    VerifyEmailTemplate {
        layout,
        token: query.token,
        redirect_url: safe_redirect(query.redirect_url.as_deref()),
        email: pending_email(&session).await,
        errors: ValidationErrors::default(),
        error: None,
    }
}

/// Handle the one-time code.
#[instrument(skip(state, session, layout, form))]
pub async fn verify_email(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<VerifyEmailForm>,
) -> Result<Response> {
    let redirect_url = safe_redirect(form.redirect_url.as_deref());
    let email = pending_email(&session).await;
    let page = |errors: ValidationErrors, error: Option<String>| VerifyEmailTemplate {
        layout,
        token: form.token.trim().to_string(),
        redirect_url: redirect_url.clone(),
        email,
        errors,
        error,
    };

    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => return Ok((StatusCode::BAD_REQUEST, page(errors, None)).into_response()),
    };

    match state.api().verify_customer_email(&request).await {
        Ok(response) => {
            let current =
                CurrentCustomer::new(response.customer, &response.token, response.expires_at);
            set_current_customer(&session, &current).await?;
            clear_pending_registration(&session).await?;
            set_sentry_user(&current.customer.id, Some(&current.customer.email));
            add_breadcrumb("auth", "Customer verified email", None);
            set_flash(&session, Toast::success("Email verified! You're now signed in.")).await;

            Ok(Redirect::to(&post_auth_redirect(form.redirect_url.as_deref())).into_response())
        }
        Err(e) => {
            let message = inline_error(&e, VERIFICATION_FAILED);
            Ok((StatusCode::BAD_REQUEST, page(ValidationErrors::default(), Some(message)))
                .into_response())
        }
    }
}

/// Re-submit the remembered registration to get a fresh code.
#[instrument(skip(state, session, form))]
pub async fn resend_code(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResendForm>,
) -> Result<Response> {
    let redirect_url = safe_redirect(form.redirect_url.as_deref());

    let Some(registration) = pending_registration(&session).await else {
        set_flash(&session, Toast::error("Please register again to resend the code.")).await;
        return Ok(Redirect::to(&with_redirect("/register", &redirect_url)).into_response());
    };

    match state.api().register_customer(&registration).await {
        Ok(response) => {
            set_pending_registration(&session, &registration).await?;
            set_flash(&session, Toast::success("A new code has been sent.")).await;
            Ok(Redirect::to(&verify_url(&response.token, &redirect_url)).into_response())
        }
        Err(e) => {
            let message = inline_error(&e, REGISTRATION_FAILED);
            set_flash(&session, Toast::error(message)).await;
            let token = SecretString::from(form.token);
            Ok(Redirect::to(&verify_url(&token, &redirect_url)).into_response())
        }
    }
}

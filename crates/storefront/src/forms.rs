//! Form payloads and their validation.
//!
//! Each form deserializes leniently (every field defaults to empty) and
//! `validate()` turns it into the backend request or a set of per-field
//! messages rendered inline next to the inputs.

use std::collections::BTreeMap;

use gravis_core::{Email, PhoneNumber, ProductId};
use serde::Deserialize;
use thiserror::Error;

use crate::api::{
    ContactInquiryPayload, GuestProductInquiryPayload, LoginCustomerRequest,
    ProductInquiryPayload, RegisterCustomerRequest, VerifyCustomerEmailRequest,
};

/// Longest enquiry or contact message.
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Longest guest name.
pub const MAX_NAME_LEN: usize = 255;

/// Longest login password.
pub const MAX_PASSWORD_LEN: usize = 100;

/// Shortest registration password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Largest quantity a guest may ask about.
pub const MAX_ENQUIRY_QUANTITY: u32 = 1000;

/// Length of the emailed verification code.
pub const OTP_LEN: usize = 6;

/// Per-field validation messages, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Parse an optional quantity. Blank or non-numeric input is omitted.
fn optional_quantity(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|q| *q > 0)
}

// =============================================================================
// Redirects
// =============================================================================

/// Query flag that opens the enquiry dialog on a product page.
pub const OPEN_ENQUIRY_PARAM: &str = "open_enquiry";

/// Only same-site paths are followed after sign-in; anything else goes home.
#[must_use]
pub fn safe_redirect(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") => {
            url.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Where to go after login or verification.
///
/// Product pages get `open_enquiry=true` so the visitor lands straight in
/// the enquiry they were trying to make.
#[must_use]
pub fn post_auth_redirect(raw: Option<&str>) -> String {
    let url = safe_redirect(raw);
    if url.starts_with("/products/") {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{OPEN_ENQUIRY_PARAM}=true")
    } else {
        url
    }
}

// =============================================================================
// Auth Forms
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect_url: Option<String>,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<LoginCustomerRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let email = Email::parse_normalized(&self.email);
        if email.is_err() {
            errors.add("email", "Please enter a valid email");
        }

        let password = self.password.trim();
        if password.is_empty() {
            errors.add("password", "Password is required");
        } else if char_len(password) > MAX_PASSWORD_LEN {
            errors.add("password", "Password must be at most 100 characters");
        }

        errors.into_result(|| LoginCustomerRequest {
            email: email.map(Email::into_inner).unwrap_or_default(),
            password: password.to_string(),
        })
    }
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub redirect_url: Option<String>,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<RegisterCustomerRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.add("first_name", "First name is required");
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.add("last_name", "Last name is required");
        }

        let email = Email::parse(self.email.trim());
        if email.is_err() {
            errors.add("email", "Please enter a valid email");
        }

        if char_len(&self.password) < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 8 characters");
        }

        let phone = PhoneNumber::parse_loose(&self.phone_number);
        if phone.is_err() {
            errors.add("phone_number", "Please enter a valid phone number");
        }

        errors.into_result(|| RegisterCustomerRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.map(Email::into_inner).unwrap_or_default(),
            password: self.password.clone(),
            phone_number: phone.map(|p| p.as_str().to_string()).unwrap_or_default(),
        })
    }

    /// Copy of the form without the password, for re-rendering.
    #[must_use]
    pub fn without_password(&self) -> Self {
        Self {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: String::new(),
            phone_number: self.phone_number.clone(),
            redirect_url: self.redirect_url.clone(),
        }
    }
}

/// Email verification form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyEmailForm {
    pub token: String,
    pub otp: String,
    pub redirect_url: Option<String>,
}

impl VerifyEmailForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<VerifyCustomerEmailRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let token = self.token.trim();
        if token.is_empty() {
            errors.add("token", "Verification token is required");
        }
        let otp = self.otp.trim();
        if char_len(otp) != OTP_LEN {
            errors.add("otp", "OTP must be 6 digits");
        }

        errors.into_result(|| VerifyCustomerEmailRequest {
            token: token.to_string(),
            otp: otp.to_string(),
        })
    }
}

// =============================================================================
// Enquiry Forms
// =============================================================================

fn validate_message(errors: &mut ValidationErrors, message: &str, required: bool) {
    if required && message.is_empty() {
        errors.add("message", "Message is required");
    } else if char_len(message) > MAX_MESSAGE_LEN {
        errors.add("message", "Message must be less than 1000 characters");
    }
}

/// Enquiry from a signed-in customer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductEnquiryForm {
    pub message: String,
    pub quantity: String,
    /// Hidden field echoed back so the re-rendered widget keeps its label.
    pub product_name: String,
}

impl ProductEnquiryForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self, product_id: &ProductId) -> Result<ProductInquiryPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let message = self.message.trim();
        validate_message(&mut errors, message, true);

        errors.into_result(|| ProductInquiryPayload {
            product_id: product_id.clone(),
            message: message.to_string(),
            quantity: optional_quantity(&self.quantity),
        })
    }
}

/// Enquiry from a visitor without an account.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GuestEnquiryForm {
    pub name: String,
    pub phone_number: String,
    pub message: String,
    pub quantity: String,
    pub product_name: String,
}

impl GuestEnquiryForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(
        &self,
        product_id: &ProductId,
    ) -> Result<GuestProductInquiryPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if char_len(name) > MAX_NAME_LEN {
            errors.add("name", "Name must be less than 255 characters");
        }

        let phone = PhoneNumber::parse_mobile(&self.phone_number);
        if phone.is_err() {
            errors.add("phone_number", "Phone number must be 10 digits");
        }

        let message = self.message.trim();
        validate_message(&mut errors, message, false);

        let quantity = match self.quantity.trim().parse::<i64>() {
            Ok(q) if (1..=i64::from(MAX_ENQUIRY_QUANTITY)).contains(&q) => u32::try_from(q).ok(),
            Ok(_) => {
                errors.add("quantity", "Quantity must be between 1 and 1000");
                None
            }
            Err(_) => None,
        };

        errors.into_result(|| GuestProductInquiryPayload {
            product_id: product_id.clone(),
            name: name.to_string(),
            phone_number: phone.map(|p| p.as_str().to_string()).unwrap_or_default(),
            message: message.to_string(),
            quantity,
        })
    }
}

/// Contact page form data.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<ContactInquiryPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.add("first_name", "First name is required");
        }

        let email = Email::parse(self.email.trim());
        if email.is_err() {
            errors.add("email", "Please enter a valid email");
        }

        let message = self.message.trim();
        validate_message(&mut errors, message, true);

        let name = match self.last_name.trim() {
            "" => first_name.to_string(),
            last => format!("{first_name} {last}"),
        };

        errors.into_result(|| ContactInquiryPayload {
            name,
            email: email.map(Email::into_inner).unwrap_or_default(),
            phone_number: self.phone.trim().to_string(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> ProductId {
        ProductId::new("0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f")
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/cart")), "/cart");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("")), "/");
        assert_eq!(safe_redirect(None), "/");
    }

    #[test]
    fn test_post_auth_redirect_opens_enquiry_on_products() {
        assert_eq!(post_auth_redirect(Some("/products/p1")), "/products/p1?open_enquiry=true");
        assert_eq!(
            post_auth_redirect(Some("/products/p1?ref=home")),
            "/products/p1?ref=home&open_enquiry=true"
        );
        assert_eq!(post_auth_redirect(Some("/products?search=pump")), "/products?search=pump");
        assert_eq!(post_auth_redirect(Some("mailto:x")), "/");
    }

    #[test]
    fn test_login_lowercases_email_and_trims_password() {
        let form = LoginForm {
            email: " Ravi@Example.COM ".to_string(),
            password: "  hunter22  ".to_string(),
            redirect_url: None,
        };
        let request = form.validate().unwrap();
        assert_eq!(request.email, "ravi@example.com");
        assert_eq!(request.password, "hunter22");
    }

    #[test]
    fn test_login_rejects_blank_and_long_passwords() {
        let mut form = LoginForm {
            email: "not-an-email".to_string(),
            password: "   ".to_string(),
            redirect_url: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email"));
        assert_eq!(errors.get("password"), Some("Password is required"));

        form.email = "a@b.co".to_string();
        form.password = "x".repeat(101);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("password"), Some("Password must be at most 100 characters"));
    }

    #[test]
    fn test_register_rules() {
        let form = RegisterForm {
            first_name: " ".to_string(),
            last_name: "Sharma".to_string(),
            email: "ravi@example.com".to_string(),
            password: "short".to_string(),
            phone_number: "12345".to_string(),
            redirect_url: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("last_name").is_none());
        assert_eq!(errors.get("password"), Some("Password must be at least 8 characters"));
        assert_eq!(errors.get("phone_number"), Some("Please enter a valid phone number"));

        let form = RegisterForm {
            first_name: "Ravi".to_string(),
            password: "long enough".to_string(),
            phone_number: "+91 98765 43210".to_string(),
            ..form
        };
        let request = form.validate().unwrap();
        assert_eq!(request.phone_number, "+91 98765 43210");
        assert!(form.without_password().password.is_empty());
    }

    #[test]
    fn test_verify_requires_six_character_otp() {
        let form = VerifyEmailForm {
            token: "tok".to_string(),
            otp: " 123456 ".to_string(),
            redirect_url: None,
        };
        assert_eq!(form.validate().unwrap().otp, "123456");

        let form = VerifyEmailForm {
            token: String::new(),
            otp: "12345".to_string(),
            redirect_url: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("token"), Some("Verification token is required"));
        assert_eq!(errors.get("otp"), Some("OTP must be 6 digits"));
    }

    #[test]
    fn test_product_enquiry_quantity_is_optional() {
        let form = ProductEnquiryForm {
            message: "  Need two units  ".to_string(),
            quantity: "abc".to_string(),
            ..Default::default()
        };
        let payload = form.validate(&product()).unwrap();
        assert_eq!(payload.message, "Need two units");
        assert_eq!(payload.quantity, None);

        let form = ProductEnquiryForm {
            message: "Need two units".to_string(),
            quantity: " 2 ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate(&product()).unwrap().quantity, Some(2));

        let form = ProductEnquiryForm {
            message: "x".repeat(1001),
            ..Default::default()
        };
        assert!(form.validate(&product()).unwrap_err().get("message").is_some());
    }

    #[test]
    fn test_guest_enquiry_rules() {
        let form = GuestEnquiryForm {
            name: " Asha ".to_string(),
            phone_number: "(987) 654-3210".to_string(),
            ..Default::default()
        };
        let payload = form.validate(&product()).unwrap();
        assert_eq!(payload.name, "Asha");
        assert_eq!(payload.phone_number, "9876543210");
        assert_eq!(payload.quantity, None);

        let form = GuestEnquiryForm {
            name: String::new(),
            phone_number: "98765".to_string(),
            quantity: "5000".to_string(),
            ..Default::default()
        };
        let errors = form.validate(&product()).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("phone_number"), Some("Phone number must be 10 digits"));
        assert!(errors.get("quantity").is_some());
    }

    #[test]
    fn test_contact_joins_names() {
        let form = ContactForm {
            first_name: "Asha".to_string(),
            last_name: " Rao ".to_string(),
            email: "asha@example.com".to_string(),
            phone: String::new(),
            message: "Hello".to_string(),
        };
        assert_eq!(form.validate().unwrap().name, "Asha Rao");

        let form = ContactForm {
            last_name: String::new(),
            ..form
        };
        assert_eq!(form.validate().unwrap().name, "Asha");

        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}

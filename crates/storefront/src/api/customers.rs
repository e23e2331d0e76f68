//! Customer account endpoints.

use reqwest::Method;
use tracing::instrument;

use super::client::{ApiClient, Visitor};
use super::types::{
    LoginCustomerRequest, LoginCustomerResponse, RegisterCustomerRequest,
    RegisterCustomerResponse, VerifyCustomerEmailRequest, VerifyCustomerEmailResponse,
};
use super::ApiError;

impl ApiClient {
    /// Register a customer. The response token is only good for email
    /// verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register_customer(
        &self,
        request: &RegisterCustomerRequest,
    ) -> Result<RegisterCustomerResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/customers/register",
            request,
            &Visitor::anonymous(),
        )
        .await
    }

    /// Confirm a registration with the emailed one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request))]
    pub async fn verify_customer_email(
        &self,
        request: &VerifyCustomerEmailRequest,
    ) -> Result<VerifyCustomerEmailResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/customers/verify-email",
            request,
            &Visitor::anonymous(),
        )
        .await
    }

    /// Sign a customer in.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login_customer(
        &self,
        request: &LoginCustomerRequest,
    ) -> Result<LoginCustomerResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/customers/login",
            request,
            &Visitor::anonymous(),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::client::tests::test_client;

    fn customer_json() -> serde_json::Value {
        json!({
            "id": "0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f",
            "first_name": "Asha",
            "last_name": "Rao",
            "full_name": "Asha Rao",
            "email": "asha@example.com",
            "phone_number": "+91 98765 43210",
            "is_email_verified": true,
            "created_at": "2026-01-05T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_login_customer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/login"))
            .and(body_json(json!({"email": "asha@example.com", "password": "secret123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customer": customer_json(),
                "token": "tok-abc",
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client
            .login_customer(&LoginCustomerRequest {
                email: "asha@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.token.expose_secret(), "tok-abc");
        assert_eq!(response.customer.full_name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_login_rejected_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "invalid_credentials",
                "message": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .login_customer(&LoginCustomerRequest {
                email: "asha@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message("Login failed. Please try again."),
            "Invalid email or password"
        );
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": "verify-tok",
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/customers/verify-email"))
            .and(body_json(json!({"token": "verify-tok", "otp": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "session-tok",
                "customer": customer_json(),
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let registered = client
            .register_customer(&RegisterCustomerRequest {
                first_name: "Asha".into(),
                last_name: "Rao".into(),
                email: "asha@example.com".into(),
                password: "secret123".into(),
                phone_number: "+91 98765 43210".into(),
            })
            .await
            .unwrap();

        let verified = client
            .verify_customer_email(&VerifyCustomerEmailRequest {
                token: registered.token.expose_secret().to_string(),
                otp: "123456".into(),
            })
            .await
            .unwrap();
        assert_eq!(verified.token.expose_secret(), "session-tok");
        assert!(verified.customer.is_email_verified);
    }
}

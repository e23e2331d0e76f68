//! Enquiry endpoints.

use reqwest::Method;
use tracing::instrument;

use super::client::{ApiClient, Visitor};
use super::types::{
    ContactInquiryPayload, GuestProductInquiryPayload, InquiryResponse, ProductInquiryPayload,
};
use super::ApiError;

impl ApiClient {
    /// Submit an enquiry about a product as the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, payload, visitor), fields(product_id = %payload.product_id))]
    pub async fn submit_product_inquiry(
        &self,
        payload: &ProductInquiryPayload,
        visitor: &Visitor,
    ) -> Result<InquiryResponse, ApiError> {
        self.send_json(Method::POST, "/inquiry/product", payload, visitor)
            .await
    }

    /// Submit an enquiry about a product without an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, payload, visitor), fields(product_id = %payload.product_id))]
    pub async fn submit_guest_product_inquiry(
        &self,
        payload: &GuestProductInquiryPayload,
        visitor: &Visitor,
    ) -> Result<InquiryResponse, ApiError> {
        self.send_json(Method::POST, "/inquiry/guest/product", payload, visitor)
            .await
    }

    /// Submit the contact page form.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, payload, visitor))]
    pub async fn submit_contact_inquiry(
        &self,
        payload: &ContactInquiryPayload,
        visitor: &Visitor,
    ) -> Result<InquiryResponse, ApiError> {
        self.send_json(Method::POST, "/inquiry/contact", payload, visitor)
            .await
    }
}

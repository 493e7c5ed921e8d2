//! Acquirer client
//!
//! Only invoice creation lives here; capture and settlement happen on the
//! acquirer's side and come back as webhook events.

use crate::core::Config;
use crate::utils::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of invoice initiation: the acquirer's reference plus the hosted
/// payment page the customer is redirected to.
#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub invoice_id: String,
    pub page_url: String,
}

/// One itemized line on the hosted payment page. Delivery charges ride as
/// pseudo-lines alongside the order items.
#[derive(Debug, Clone, Serialize)]
pub struct BasketLine {
    pub name: String,
    pub qty: i64,
    /// Line total in minor currency units.
    pub sum: i64,
}

/// Seam for the acquirer. The order pipeline only needs invoice creation;
/// tests substitute a canned implementation.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an invoice for `amount_minor` (minor currency units).
    /// `reference` is our order id, echoed back in webhook events.
    async fn init_invoice(
        &self,
        amount_minor: i64,
        reference: &str,
        destination: &str,
        basket: &[BasketLine],
    ) -> AppResult<CreatedInvoice>;
}

/// Monobank-style merchant acquiring client.
#[derive(Debug, Clone)]
pub struct AcquiringClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    redirect_url: String,
    webhook_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceRequest<'a> {
    amount: i64,
    merchant_paym_info: MerchantPaymInfo<'a>,
    #[serde(skip_serializing_if = "str::is_empty")]
    redirect_url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    web_hook_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MerchantPaymInfo<'a> {
    reference: &'a str,
    destination: &'a str,
    #[serde(skip_serializing_if = "<[BasketLine]>::is_empty")]
    basket_order: &'a [BasketLine],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceResponse {
    invoice_id: String,
    page_url: String,
}

impl AcquiringClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.payment_api_url.clone(),
            token: config.payment_token.clone(),
            redirect_url: config.payment_redirect_url.clone(),
            webhook_url: config.payment_webhook_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentProvider for AcquiringClient {
    async fn init_invoice(
        &self,
        amount_minor: i64,
        reference: &str,
        destination: &str,
        basket: &[BasketLine],
    ) -> AppResult<CreatedInvoice> {
        let url = format!("{}/api/merchant/invoice/create", self.base_url);
        let body = InvoiceRequest {
            amount: amount_minor,
            merchant_paym_info: MerchantPaymInfo {
                reference,
                destination,
                basket_order: basket,
            },
            redirect_url: &self.redirect_url,
            web_hook_url: &self.webhook_url,
        };

        let response = self
            .http
            .post(&url)
            .header("X-Token", &self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Invoice request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "Invoice creation returned {status}: {text}"
            )));
        }

        let invoice: InvoiceResponse = response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("Invalid invoice response: {e}")))?;

        tracing::info!(
            reference,
            invoice_id = %invoice.invoice_id,
            amount_minor,
            "Invoice created"
        );
        Ok(CreatedInvoice {
            invoice_id: invoice.invoice_id,
            page_url: invoice.page_url,
        })
    }
}

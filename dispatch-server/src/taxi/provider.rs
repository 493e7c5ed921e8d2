//! Taxi provider client

use crate::utils::{AppError, AppResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Quoted ride: the price plus the provider's opaque destination payload,
/// which must be echoed back verbatim when ordering.
#[derive(Debug, Clone)]
pub struct TaxiEstimate {
    pub price: f64,
    pub payload_to: String,
}

#[async_trait]
pub trait TaxiProvider: Send + Sync {
    async fn estimate(&self, address: &str, comment: &str) -> AppResult<TaxiEstimate>;
    /// Order a previously estimated ride. Returns the provider status.
    async fn order(&self, payload_to: &str, phone: &str, comment: &str) -> AppResult<String>;
}

#[derive(Debug, Clone)]
pub struct OnTaxiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    price: f64,
    #[serde(default)]
    payload_to: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    #[serde(default)]
    status: String,
}

impl OnTaxiClient {
    pub fn new(base_url: String, token: String) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    async fn post<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> AppResult<R> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Taxi request {path} failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::internal(format!("Taxi {path} returned {status}")));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Taxi {path} returned invalid body: {e}")))
    }
}

#[async_trait]
impl TaxiProvider for OnTaxiClient {
    async fn estimate(&self, address: &str, comment: &str) -> AppResult<TaxiEstimate> {
        let response: EstimateResponse = self
            .post("delivery/estimate", &json!({ "to": address, "comment": comment }))
            .await?;
        Ok(TaxiEstimate {
            price: response.price,
            payload_to: response.payload_to,
        })
    }

    async fn order(&self, payload_to: &str, phone: &str, comment: &str) -> AppResult<String> {
        let response: OrderResponse = self
            .post(
                "delivery/order",
                &json!({ "to": payload_to, "phone": phone, "comment": comment }),
            )
            .await?;
        Ok(response.status)
    }
}

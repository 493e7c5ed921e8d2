//! Syrve cloud API client
//!
//! All endpoints are POST with a bearer token from `access_token`. The POS
//! is the slowest dependency in the system; calls carry the configured
//! timeout and surface failures as `AppError::Pos` for the workers to
//! classify.

use crate::core::Config;
use crate::utils::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use super::types::*;

#[derive(Debug, Clone)]
pub struct SyrveClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SyrveClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.syrve_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.syrve_api_url.clone(),
            api_key: config.syrve_api_key.clone(),
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> AppResult<R> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::pos(format!("POS request {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::pos(format!("POS {path} returned {status}: {text}")));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::pos(format!("POS {path} returned invalid body: {e}")))
    }

    pub async fn access_token(&self) -> AppResult<String> {
        let response: AccessToken = self
            .post("access_token", None, &json!({ "apiLogin": self.api_key }))
            .await?;
        Ok(response.token)
    }

    pub async fn organizations(&self, token: &str) -> AppResult<Vec<Organization>> {
        let response: OrganizationsResponse = self
            .post("organizations", Some(token), &json!({}))
            .await?;
        Ok(response.organizations)
    }

    pub async fn terminal_groups(
        &self,
        token: &str,
        organization_id: &str,
    ) -> AppResult<Vec<TerminalGroup>> {
        let response: TerminalGroupsResponse = self
            .post(
                "terminal_groups",
                Some(token),
                &json!({ "organizationIds": [organization_id] }),
            )
            .await?;
        Ok(response
            .terminal_groups
            .into_iter()
            .flat_map(|block| block.items)
            .collect())
    }

    pub async fn restaurant_sections(
        &self,
        token: &str,
        terminal_group_id: &str,
    ) -> AppResult<Vec<RestaurantSection>> {
        let response: SectionsResponse = self
            .post(
                "reserve/available_restaurant_sections",
                Some(token),
                &json!({ "terminalGroupIds": [terminal_group_id] }),
            )
            .await?;
        Ok(response.restaurant_sections)
    }

    /// Active orders on the given tables since `date_from`.
    pub async fn orders_by_table(
        &self,
        token: &str,
        organization_id: &str,
        table_ids: &[String],
        date_from: DateTime<Utc>,
    ) -> AppResult<Vec<TableOrder>> {
        let response: TableOrdersResponse = self
            .post(
                "order/by_table",
                Some(token),
                &json!({
                    "organizationIds": [organization_id],
                    "tableIds": table_ids,
                    "dateFrom": date_from.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                }),
            )
            .await?;
        Ok(response.orders)
    }

    pub async fn nomenclature(&self, token: &str, organization_id: &str) -> AppResult<Nomenclature> {
        self.post(
            "nomenclature",
            Some(token),
            &json!({ "organizationId": organization_id }),
        )
        .await
    }

    pub async fn order_types(
        &self,
        token: &str,
        organization_id: &str,
    ) -> AppResult<Vec<PosOrderType>> {
        let response: OrderTypesResponse = self
            .post(
                "deliveries/order_types",
                Some(token),
                &json!({ "organizationIds": [organization_id] }),
            )
            .await?;
        Ok(response
            .order_types
            .into_iter()
            .flat_map(|block| block.items)
            .collect())
    }

    /// Stop list flattened from the nested organization -> terminal-group
    /// -> item structure.
    pub async fn stop_lists(
        &self,
        token: &str,
        organization_id: &str,
    ) -> AppResult<Vec<StopListItem>> {
        let response: StopListsResponse = self
            .post(
                "stop_lists",
                Some(token),
                &json!({ "organizationIds": [organization_id] }),
            )
            .await?;
        Ok(response
            .terminal_group_stop_lists
            .into_iter()
            .flat_map(|org| org.items)
            .flat_map(|group| group.items)
            .collect())
    }

    pub async fn create_order(
        &self,
        token: &str,
        request: &CreateOrderRequest,
    ) -> AppResult<CreateOrderResponse> {
        self.post("order/create", Some(token), request).await
    }
}

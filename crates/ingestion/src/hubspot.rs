//! HubSpot CRM client
//!
//! Thin reqwest adapter over the three endpoints the exporter needs. No
//! retry or rate-limit handling: a non-success status is returned as an error.

use std::time::Duration;

use contracts::{
    ContractError, CrmConfig, CrmSource, Deal, DealPage, DealSearchRequest, PipelineStages,
    PropertyOption,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

const PIPELINES_PATH: &str = "/crm/v3/pipelines/deals";
const PROPERTIES_PATH: &str = "/crm/v3/properties/deals";
const SEARCH_PATH: &str = "/crm/v3/objects/deals/search";

/// Bearer-token HubSpot client
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PipelinesResponse {
    #[serde(default)]
    results: Vec<PipelineStages>,
}

#[derive(Debug, Deserialize)]
struct PropertyResponse {
    #[serde(default)]
    options: Vec<PropertyOption>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Deal>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: Option<String>,
}

impl SearchResponse {
    fn into_page(self) -> DealPage {
        DealPage {
            results: self.results,
            next_after: self.paging.and_then(|p| p.next).and_then(|n| n.after),
        }
    }
}

impl HubSpotClient {
    /// Create a client for `base_url` authenticated with `token`
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| IngestionError::ClientSetup {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create a client from configuration, reading the token from `token_env`
    pub fn from_config(config: &CrmConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IngestionError::MissingToken {
                var: config.token_env.clone(),
            })?;
        Self::new(&config.base_url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ContractError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ContractError::crm_request(path, None, e.to_string()))?;
        decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> std::result::Result<T, ContractError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ContractError::crm_request(path, None, e.to_string()))?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    path: &str,
    response: Response,
) -> std::result::Result<T, ContractError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ContractError::crm_request(path, Some(status.as_u16()), body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ContractError::crm_request(path, Some(status.as_u16()), e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ContractError::crm_response(path, e.to_string()))
}

/// JSON body of a pipeline-filtered search
pub fn search_body(request: &DealSearchRequest) -> Value {
    let mut body = json!({
        "filterGroups": [{
            "filters": [{
                "propertyName": "pipeline",
                "operator": "EQ",
                "value": request.pipeline_id,
            }]
        }],
        "properties": request.properties,
        "limit": request.limit,
    });
    if let Some(after) = &request.after {
        body["after"] = Value::String(after.clone());
    }
    body
}

impl CrmSource for HubSpotClient {
    #[instrument(name = "hubspot_fetch_pipelines", skip(self))]
    async fn fetch_pipelines(&self) -> std::result::Result<Vec<PipelineStages>, ContractError> {
        let response: PipelinesResponse = self.get_json(PIPELINES_PATH).await?;
        debug!(pipelines = response.results.len(), "pipelines received");
        Ok(response.results)
    }

    #[instrument(name = "hubspot_fetch_property_options", skip(self))]
    async fn fetch_property_options(
        &self,
        property: &str,
    ) -> std::result::Result<Vec<PropertyOption>, ContractError> {
        let path = format!("{PROPERTIES_PATH}/{property}");
        let response: PropertyResponse = self.get_json(&path).await?;
        debug!(options = response.options.len(), "property options received");
        Ok(response.options)
    }

    #[instrument(
        name = "hubspot_search_deals",
        skip(self, request),
        fields(pipeline_id = %request.pipeline_id, after = ?request.after)
    )]
    async fn search_deals(
        &self,
        request: &DealSearchRequest,
    ) -> std::result::Result<DealPage, ContractError> {
        let body = search_body(request);
        let response: SearchResponse = self.post_json(SEARCH_PATH, &body).await?;
        Ok(response.into_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body_first_page_has_no_cursor() {
        let request = DealSearchRequest {
            pipeline_id: "1347411134".into(),
            properties: vec!["dealname".into(), "amount".into()],
            limit: 100,
            after: None,
        };
        let body = search_body(&request);
        assert_eq!(body["filterGroups"][0]["filters"][0]["propertyName"], "pipeline");
        assert_eq!(body["filterGroups"][0]["filters"][0]["operator"], "EQ");
        assert_eq!(body["filterGroups"][0]["filters"][0]["value"], "1347411134");
        assert_eq!(body["limit"], 100);
        assert_eq!(body["properties"][1], "amount");
        assert!(body.get("after").is_none());
    }

    #[test]
    fn test_search_body_carries_cursor() {
        let request = DealSearchRequest {
            pipeline_id: "1".into(),
            properties: vec![],
            limit: 10,
            after: Some("200".into()),
        };
        assert_eq!(search_body(&request)["after"], "200");
    }

    #[test]
    fn test_search_response_paging() {
        let json = r#"{
            "total": 2,
            "results": [
                { "id": "1", "properties": { "dealname": "A", "amount": null } },
                { "id": "2", "properties": { "dealname": "B" } }
            ],
            "paging": { "next": { "after": "2", "link": "?after=2" } }
        }"#;
        let page = serde_json::from_str::<SearchResponse>(json).unwrap().into_page();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].property("amount"), None);
        assert_eq!(page.continuation(), Some("2"));

        let last = r#"{ "total": 0, "results": [] }"#;
        let page = serde_json::from_str::<SearchResponse>(last).unwrap().into_page();
        assert!(page.results.is_empty());
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn test_pipelines_response() {
        let json = r#"{ "results": [ {
            "id": "1347411134", "label": "Partnership", "displayOrder": 0,
            "stages": [ { "id": "1834011865", "label": "Proposal sent", "displayOrder": 1 } ]
        } ] }"#;
        let response: PipelinesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results[0].stages[0].label, "Proposal sent");
    }

    #[test]
    fn test_property_response() {
        let json = r#"{ "name": "instore_category", "type": "enumeration",
            "options": [ { "label": "Food", "value": "food", "hidden": false } ] }"#;
        let response: PropertyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.options[0].value, "food");
    }

    #[test]
    fn test_missing_token_env() {
        let config = CrmConfig {
            base_url: "http://localhost".into(),
            token_env: "DEAL_EXPORTER_TEST_TOKEN_UNSET".into(),
            active_pipeline_id: "1".into(),
            category_property: "instore_category".into(),
            page_size: 100,
        };
        let err = HubSpotClient::from_config(&config).unwrap_err();
        assert!(matches!(err, IngestionError::MissingToken { .. }));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HubSpotClient::new("https://api.hubapi.com/", "t").unwrap();
        assert_eq!(client.base_url(), "https://api.hubapi.com");
        assert_eq!(client.url(SEARCH_PATH), "https://api.hubapi.com/crm/v3/objects/deals/search");
    }
}

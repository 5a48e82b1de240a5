//! CrmSource trait - CRM data source abstraction
//!
//! Decouples the Label Resolver and Record Fetcher from the concrete CRM
//! client, so the HTTP client and the in-memory mock share one API.

use crate::{ContractError, DealPage, DealSearchRequest, PipelineStages, PropertyOption};

/// CRM data source
///
/// # Example
///
/// ```ignore
/// let source = HubSpotClient::new(config, token)?;
/// let pipelines = source.fetch_pipelines().await?;
/// let page = source.search_deals(&request).await?;
/// ```
#[trait_variant::make(CrmSource: Send)]
pub trait LocalCrmSource {
    /// All deal pipelines with their stages
    async fn fetch_pipelines(&self) -> Result<Vec<PipelineStages>, ContractError>;

    /// Enumeration options of a deal property
    async fn fetch_property_options(
        &self,
        property: &str,
    ) -> Result<Vec<PropertyOption>, ContractError>;

    /// One page of a pipeline-filtered deal search
    async fn search_deals(&self, request: &DealSearchRequest) -> Result<DealPage, ContractError>;
}

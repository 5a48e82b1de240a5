//! Record Fetcher
//!
//! Cursor-based retrieval of every deal of one pipeline. Pages are
//! accumulated in memory; the rest of the pipeline sees the complete set.

use std::collections::HashSet;

use contracts::{
    stage_ids, CrmSource, Deal, DealSearchRequest, PipelineDefinition, StageField, StageRole,
    DESCRIPTIVE_PROPERTIES, PARTNER_PROPERTIES, RISK_PROPERTIES,
};
use metrics::counter;
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};

/// Properties requested on every deal
///
/// Fixed descriptive, risk and partner fields, then the per-stage families
/// for every stage id of every pipeline definition. Duplicates are removed,
/// first occurrence wins.
pub fn requested_properties(pipelines: &[PipelineDefinition]) -> Vec<String> {
    let fixed = DESCRIPTIVE_PROPERTIES
        .iter()
        .chain(RISK_PROPERTIES.iter())
        .chain(PARTNER_PROPERTIES.iter())
        .map(|p| p.to_string());

    let entered = [
        StageRole::KycPending,
        StageRole::OnboardingCompleted,
        StageRole::ProposalSent,
    ]
    .into_iter()
    .flat_map(|role| stage_ids(pipelines, role))
    .map(|id| StageField::DateEntered.property_name(id));

    let proposal = stage_ids(pipelines, StageRole::ProposalSent);
    let exited = proposal
        .iter()
        .map(|id| StageField::DateExited.property_name(id));
    let cumulative = proposal
        .iter()
        .map(|id| StageField::CumulativeTime.property_name(id));

    let mut seen = HashSet::new();
    fixed
        .chain(entered)
        .chain(exited)
        .chain(cumulative)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Fetch every deal of `pipeline_id`
///
/// Pagination ends when the server omits the next cursor (or sends an empty
/// one) or returns an empty page. A short page that still carries a cursor
/// does not end it.
///
/// # Errors
/// The first failed page request aborts the fetch.
#[instrument(
    name = "fetch_deals",
    skip(source, properties),
    fields(pipeline_id = %pipeline_id, properties = properties.len())
)]
pub async fn fetch_deals<S: CrmSource + Sync>(
    source: &S,
    pipeline_id: &str,
    properties: &[String],
    page_size: u32,
) -> Result<Vec<Deal>> {
    let mut deals = Vec::new();
    let mut after: Option<String> = None;
    let mut page: u32 = 0;

    loop {
        page += 1;
        let request = DealSearchRequest {
            pipeline_id: pipeline_id.to_string(),
            properties: properties.to_vec(),
            limit: page_size,
            after: after.take(),
        };

        let response =
            source
                .search_deals(&request)
                .await
                .map_err(|source| IngestionError::PageFetch {
                    pipeline_id: pipeline_id.to_string(),
                    page,
                    source,
                })?;

        counter!("deal_exporter_pages_fetched_total").increment(1);

        if response.results.is_empty() {
            debug!(page, "empty page, stopping");
            break;
        }

        let next = response.continuation().map(str::to_string);
        let received = response.results.len();
        counter!("deal_exporter_deals_fetched_total").increment(received as u64);
        deals.extend(response.results);

        info!(page, received, total = deals.len(), "fetched deals page");

        match next {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    info!(pages = page, total = deals.len(), "deal fetch complete");
    Ok(deals)
}

//! Label Resolver
//!
//! Builds the stage and category label tables once per run. Upstream
//! failures degrade to an empty table: every downstream lookup then falls
//! back to the raw id.

use contracts::{CategoryLabelTable, CrmSource, LabelTable, StageLabelTable};
use metrics::gauge;
use tracing::{debug, instrument, warn};

/// Stage id -> label across every pipeline of the CRM
#[instrument(name = "resolve_stage_labels", skip(source))]
pub async fn resolve_stage_labels<S: CrmSource + Sync>(source: &S) -> StageLabelTable {
    let table = match source.fetch_pipelines().await {
        Ok(pipelines) => LabelTable::from_pipelines(&pipelines),
        Err(e) => {
            warn!(error = %e, "failed to load stage labels, falling back to raw ids");
            LabelTable::empty()
        }
    };

    if table.is_empty() {
        warn!("stage label table is empty");
    }
    debug!(entries = table.len(), "stage labels resolved");
    gauge!("deal_exporter_label_table_size", "table" => "stage").set(table.len() as f64);
    table
}

/// Option value -> label of the enumeration property `field`
#[instrument(name = "resolve_category_labels", skip(source))]
pub async fn resolve_category_labels<S: CrmSource + Sync>(
    source: &S,
    field: &str,
) -> CategoryLabelTable {
    let table = match source.fetch_property_options(field).await {
        Ok(options) => LabelTable::from_options(&options),
        Err(e) => {
            warn!(error = %e, field, "failed to load category labels, falling back to raw codes");
            LabelTable::empty()
        }
    };

    if table.is_empty() {
        warn!(field, "category label table is empty");
    }
    debug!(entries = table.len(), "category labels resolved");
    gauge!("deal_exporter_label_table_size", "table" => "category").set(table.len() as f64);
    table
}

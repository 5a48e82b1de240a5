//! Export orchestrator - one linear pass over the CRM.
//!
//! Steps:
//! 1. stage labels
//! 2. category labels
//! 3. fetch every deal of the active pipeline
//! 4. prepare sinks
//! 5. filter, derive and publish per partner

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::{CrmSource, ExportBlueprint, PartnerSpec, SheetSink};
use dispatcher::{DispatcherError, Publisher};
use ingestion::{fetch_deals, requested_properties, resolve_category_labels, resolve_stage_labels};
use observability::{PartnerOutcome, PartnerStatus, RunStats};
use tracing::{info, instrument, warn};
use transform::{build_table, filter_deals, DerivationContext};

/// One export run over a loaded blueprint
pub struct Exporter<'a> {
    blueprint: &'a ExportBlueprint,
    partners: Vec<&'a PartnerSpec>,
}

impl<'a> Exporter<'a> {
    /// Restrict the run to `only` keywords when non-empty
    pub fn new(blueprint: &'a ExportBlueprint, only: &'a [String]) -> Result<Self> {
        let partners: Vec<_> = blueprint.selected_partners(only).collect();
        if partners.is_empty() {
            anyhow::bail!("No configured partner matches {:?}", only);
        }
        Ok(Self {
            blueprint,
            partners,
        })
    }

    pub fn partners(&self) -> &[&'a PartnerSpec] {
        &self.partners
    }

    /// Run the five steps
    ///
    /// `prepare_sinks` is awaited at step 4, after all deals are in memory.
    /// The first publish failure stops the run; partners already written
    /// stay written.
    #[instrument(
        name = "export_run",
        skip_all,
        fields(partners = self.partners.len(), pipeline = %self.blueprint.crm.active_pipeline_id)
    )]
    pub async fn run<C, S, F, Fut>(
        &self,
        source: &C,
        prepare_sinks: F,
        now: DateTime<Utc>,
    ) -> Result<RunStats>
    where
        C: CrmSource + Sync,
        S: SheetSink,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Publisher<S>, DispatcherError>>,
    {
        let started = Instant::now();
        let blueprint = self.blueprint;
        let mut stats = RunStats::new();

        info!("[1/5] stage labels");
        let stage_labels = resolve_stage_labels(source).await;
        stats.stage_labels = stage_labels.len();

        info!(field = %blueprint.crm.category_property, "[2/5] category labels");
        let category_labels =
            resolve_category_labels(source, &blueprint.crm.category_property).await;
        stats.category_labels = category_labels.len();

        info!(
            pipeline = %blueprint.crm.active_pipeline_id,
            page_size = blueprint.crm.page_size,
            "[3/5] fetch deals"
        );
        let properties = requested_properties(&blueprint.pipelines);
        let deals = fetch_deals(
            source,
            &blueprint.crm.active_pipeline_id,
            &properties,
            blueprint.crm.page_size,
        )
        .await
        .context("Failed to fetch deals")?;
        stats.deals_fetched = deals.len();
        info!(deals = deals.len(), properties = properties.len(), "deals fetched");

        info!(sinks = blueprint.sinks.len(), "[4/5] prepare sinks");
        let mut publisher = prepare_sinks().await.context("Failed to prepare sinks")?;
        if publisher.is_empty() {
            warn!("no sinks configured, tables will only be derived");
        }

        info!(partners = self.partners.len(), "[5/5] export per partner");
        let ctx = DerivationContext::new(
            &blueprint.pipelines,
            &stage_labels,
            &category_labels,
            now,
        );

        for partner in &self.partners {
            let matched =
                filter_deals(&deals, &blueprint.crm.active_pipeline_id, &partner.keyword);

            if matched.is_empty() {
                info!(partner = %partner.keyword, "no matching deals, skipping");
                stats.push_partner(PartnerOutcome {
                    keyword: partner.keyword.clone(),
                    sheet_name: partner.sheet_name.clone(),
                    deals: 0,
                    status: PartnerStatus::Skipped,
                });
                continue;
            }

            let table = build_table(&matched, &ctx, partner);
            match publisher.publish(&table).await {
                Ok(summary) => {
                    info!(
                        partner = %partner.keyword,
                        sheet = %partner.sheet_name,
                        rows = summary.rows,
                        cells = summary.updated_cells(),
                        "partner published"
                    );
                    stats.push_partner(PartnerOutcome {
                        keyword: partner.keyword.clone(),
                        sheet_name: partner.sheet_name.clone(),
                        deals: matched.len(),
                        status: PartnerStatus::Published {
                            updated_cells: summary.updated_cells(),
                        },
                    });
                }
                Err(e) => {
                    stats.push_partner(PartnerOutcome {
                        keyword: partner.keyword.clone(),
                        sheet_name: partner.sheet_name.clone(),
                        deals: matched.len(),
                        status: PartnerStatus::Failed,
                    });
                    if let Err(close_err) = publisher.close().await {
                        warn!(error = %close_err, "sink close failed after publish error");
                    }
                    stats.duration = started.elapsed();
                    warn!(published = stats.published(), "run aborted\n{stats}");
                    return Err(e)
                        .with_context(|| format!("Failed to publish partner '{}'", partner.keyword));
                }
            }
        }

        publisher.close().await.context("Failed to close sinks")?;
        stats.duration = started.elapsed();
        info!(
            published = stats.published(),
            skipped = stats.skipped(),
            cells = stats.total_cells(),
            "export finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::{
        ContractError, CrmConfig, Deal, PartnerKind, PipelineDefinition, PipelineStages,
        PublishReceipt, ScheduleConfig, SheetTable, StageOption,
    };
    use ingestion::MockCrmSource;
    use std::sync::{Arc, Mutex};

    const ACTIVE: &str = "1347411134";

    #[derive(Clone, Default)]
    struct Recorder {
        tables: Arc<Mutex<Vec<SheetTable>>>,
        fail_on: Option<String>,
    }

    impl SheetSink for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
            if self.fail_on.as_deref() == Some(table.sheet_name.as_str()) {
                return Err(ContractError::sink_write("recorder", "permission denied"));
            }
            self.tables.lock().unwrap().push(table.clone());
            Ok(PublishReceipt {
                updated_cells: table.cell_count(),
            })
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn blueprint() -> ExportBlueprint {
        ExportBlueprint {
            version: Default::default(),
            crm: CrmConfig {
                base_url: "http://localhost".into(),
                token_env: "UNUSED".into(),
                active_pipeline_id: ACTIVE.into(),
                category_property: "instore_category".into(),
                page_size: 2,
            },
            pipelines: vec![PipelineDefinition {
                name: "partnership".into(),
                pipeline_id: ACTIVE.into(),
                proposal_sent: "100".into(),
                kyc_pending: "101".into(),
                onboarding_completed: "102".into(),
            }],
            partners: vec![
                PartnerSpec::new("Smallpay", "SmallPay"),
                PartnerSpec::new("Attitude", "Attitude"),
                PartnerSpec::new("PostePay", "PostePay"),
            ],
            sinks: vec![],
            schedule: ScheduleConfig::default(),
        }
    }

    fn deal(id: &str, partner: &str) -> Deal {
        Deal::new(
            id,
            [
                ("dealname", format!("Shop {id}")),
                ("pipeline", ACTIVE.to_string()),
                ("dealstage", "100".to_string()),
                ("partner_label_name", partner.to_string()),
                ("amount", "60000".to_string()),
            ],
        )
    }

    fn source() -> MockCrmSource {
        MockCrmSource::new()
            .with_pipelines(vec![PipelineStages {
                id: ACTIVE.into(),
                label: "Partnership".into(),
                stages: vec![StageOption {
                    id: "100".into(),
                    label: "Proposal Sent".into(),
                }],
            }])
            .with_pages(vec![
                vec![deal("1", "SmallPay Srl"), deal("2", "Attitude Italia")],
                vec![deal("3", "smallpay")],
            ])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_run_publishes_and_skips() {
        let blueprint = blueprint();
        let exporter = Exporter::new(&blueprint, &[]).unwrap();
        let recorder = Recorder::default();
        let sink = recorder.clone();

        let stats = exporter
            .run(&source(), || async { Ok(Publisher::new(vec![sink])) }, now())
            .await
            .unwrap();

        assert_eq!(stats.deals_fetched, 3);
        assert_eq!(stats.stage_labels, 1);
        assert_eq!(stats.published(), 2);
        assert_eq!(stats.skipped(), 1);

        let tables = recorder.tables.lock().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].sheet_name, "SmallPay");
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[1].sheet_name, "Attitude");
        assert_eq!(tables[1].headers.len(), PartnerKind::Attitude.column_count());
        assert_eq!(tables[0].rows[0][4].as_text(), Some("Proposal Sent"));
    }

    #[tokio::test]
    async fn test_partner_filter_restricts_run() {
        let blueprint = blueprint();
        let only = vec!["Attitude".to_string()];
        let exporter = Exporter::new(&blueprint, &only).unwrap();
        assert_eq!(exporter.partners().len(), 1);

        let recorder = Recorder::default();
        let sink = recorder.clone();
        let stats = exporter
            .run(&source(), || async { Ok(Publisher::new(vec![sink])) }, now())
            .await
            .unwrap();
        assert_eq!(stats.partners.len(), 1);
        assert_eq!(recorder.tables.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_partner_rejected() {
        let blueprint = blueprint();
        let only = vec!["Nobody".to_string()];
        assert!(Exporter::new(&blueprint, &only).is_err());
    }

    #[tokio::test]
    async fn test_publish_failure_stops_run() {
        let blueprint = blueprint();
        let exporter = Exporter::new(&blueprint, &[]).unwrap();
        let recorder = Recorder {
            fail_on: Some("Attitude".into()),
            ..Recorder::default()
        };
        let sink = recorder.clone();

        let err = exporter
            .run(&source(), || async { Ok(Publisher::new(vec![sink])) }, now())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Attitude"), "got: {err:#}");

        let tables = recorder.tables.lock().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].sheet_name, "SmallPay");
    }

    #[tokio::test]
    async fn test_fetch_failure_never_prepares_sinks() {
        let blueprint = blueprint();
        let exporter = Exporter::new(&blueprint, &[]).unwrap();
        let prepared = Arc::new(Mutex::new(false));
        let flag = prepared.clone();

        let result = exporter
            .run(
                &source().fail_search_on_page(2),
                || async move {
                    *flag.lock().unwrap() = true;
                    Ok(Publisher::new(vec![Recorder::default()]))
                },
                now(),
            )
            .await;

        assert!(result.is_err());
        assert!(!*prepared.lock().unwrap());
    }
}

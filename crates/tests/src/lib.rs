//! # Integration Tests
//!
//! End-to-end scenarios wiring the crates together without network access:
//! `MockCrmSource` -> ingestion -> transform -> dispatcher.

#[cfg(test)]
mod contract_tests {
    use contracts::{BaseColumn, PartnerKind};

    #[test]
    fn test_blueprint_version_survives_rendering() {
        use config_loader::{ConfigFormat, ConfigLoader};
        use contracts::ConfigVersion;

        let content = r#"
[crm]
active_pipeline_id = "1"

[[pipelines]]
name = "partnership"
pipeline_id = "1"
proposal_sent = "11"
kyc_pending = "12"
onboarding_completed = "13"

[[partners]]
keyword = "Attitude"
sheet_name = "Attitude"
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);

        let rendered = ConfigLoader::to_toml(&blueprint).unwrap();
        assert!(rendered.contains("version = \"V1\""), "got: {rendered}");
        let reloaded = ConfigLoader::load_from_str(&rendered, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.version, ConfigVersion::V1);
        assert_eq!(reloaded.partners[0].kind(), PartnerKind::Attitude);
    }

    #[test]
    fn test_schema_snapshot() {
        let headers = PartnerKind::Default.headers();
        assert_eq!(headers.len(), BaseColumn::ALL.len());
        assert_eq!(headers.first().map(String::as_str), Some("Deal ID"));
        assert_eq!(PartnerKind::from_keyword("Attitude"), PartnerKind::Attitude);
        assert_eq!(PartnerKind::from_keyword("Deutsche Bank"), PartnerKind::DeutscheBank);
        assert_eq!(PartnerKind::from_keyword("PostePay"), PartnerKind::Default);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        BaseColumn, CellValue, ContractError, Deal, ExportBlueprint, PipelineStages,
        PropertyOption, PublishReceipt, SheetSink, SheetTable, SinkConfig, SinkType, StageOption,
    };
    use dispatcher::{create_publisher, DispatcherError, Publisher};
    use ingestion::{fetch_deals, requested_properties, resolve_category_labels, resolve_stage_labels, MockCrmSource};
    use transform::{build_table, filter_deals, DerivationContext};

    const ACTIVE: &str = "1347411134";

    const CONFIG: &str = r#"
[crm]
active_pipeline_id = "1347411134"
page_size = 2

[[pipelines]]
name = "legacy"
pipeline_id = "900"
proposal_sent = "71"
kyc_pending = "72"
onboarding_completed = "73"

[[pipelines]]
name = "partnership"
pipeline_id = "1347411134"
proposal_sent = "1834011865"
kyc_pending = "1834011866"
onboarding_completed = "2019816637"

[[partners]]
keyword = "Smallpay"
sheet_name = "SmallPay"

[[partners]]
keyword = "Deutsche Bank"
sheet_name = "Deutsche Bank"

[[partners]]
keyword = "Attitude"
sheet_name = "Attitude"

[[partners]]
keyword = "PostePay"
sheet_name = "PostePay"
"#;

    /// In-memory sink keeping every table it receives
    #[derive(Clone, Default)]
    struct RecordingSink {
        tables: Arc<Mutex<Vec<SheetTable>>>,
        fail_on: Option<String>,
    }

    impl RecordingSink {
        fn sheets(&self) -> Vec<String> {
            self.tables
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.sheet_name.clone())
                .collect()
        }

        fn table(&self, sheet: &str) -> SheetTable {
            self.tables
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.sheet_name == sheet)
                .cloned()
                .unwrap()
        }
    }

    impl SheetSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
            if self.fail_on.as_deref() == Some(table.sheet_name.as_str()) {
                return Err(ContractError::sink_write("recording", "quota exceeded"));
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
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    fn deal(id: &str, props: &[(&str, &str)]) -> Deal {
        let mut all = vec![("pipeline", ACTIVE)];
        all.extend_from_slice(props);
        Deal::new(id, all)
    }

    fn crm() -> MockCrmSource {
        MockCrmSource::new()
            .with_pipelines(vec![PipelineStages {
                id: ACTIVE.into(),
                label: "Partnership".into(),
                stages: vec![
                    StageOption {
                        id: "1834011865".into(),
                        label: "Proposal Sent".into(),
                    },
                    StageOption {
                        id: "2019816637".into(),
                        label: "Onboarding Completed".into(),
                    },
                ],
            }])
            .with_property_options(
                "instore_category",
                vec![PropertyOption {
                    value: "food".into(),
                    label: "Food & Beverage".into(),
                }],
            )
            .with_pages(vec![
                vec![
                    // physical store: 30000 / 0.05 = 600000
                    deal(
                        "1",
                        &[
                            ("partner_label_name", "SmallPay Srl"),
                            ("dealstage", "2019816637"),
                            ("amount", "30000"),
                            ("store_type", "Physical Store"),
                            ("instore_category", "food"),
                            ("hs_v2_date_entered_71", "2024-05-01T08:00:00Z"),
                            ("hs_v2_date_exited_71", "2024-05-01T20:30:00Z"),
                            ("hs_v2_cumulative_time_in_71", "45000000"),
                        ],
                    ),
                    // online store, still in proposal since midnight UTC
                    deal(
                        "2",
                        &[
                            ("partner_label_name", "smallpay"),
                            ("dealstage", "1834011865"),
                            ("amount", "30000"),
                            ("store_type", "Online"),
                            ("hs_v2_date_entered_1834011865", "2024-05-20T00:00:00Z"),
                        ],
                    ),
                ],
                vec![
                    deal(
                        "3",
                        &[
                            ("partner_label_name", "Deutsche Bank AG"),
                            ("dealstage", "unknown-stage"),
                            ("original_agent_email", "agent@example.com"),
                            ("third_party___customer_tier", "Gold"),
                        ],
                    ),
                    deal(
                        "4",
                        &[("partner_label_name", "Attitude Italia"), ("amount", "12000000")],
                    ),
                ],
                vec![Deal::new(
                    "5",
                    [("pipeline", "900"), ("partner_label_name", "PostePay")],
                )],
            ])
    }

    /// The per-partner loop, as the binary runs it
    async fn export<S: SheetSink>(
        blueprint: &ExportBlueprint,
        source: &MockCrmSource,
        publisher: &mut Publisher<S>,
    ) -> Result<Vec<String>, DispatcherError> {
        let stages = resolve_stage_labels(source).await;
        let categories = resolve_category_labels(source, &blueprint.crm.category_property).await;
        let properties = requested_properties(&blueprint.pipelines);
        let deals = fetch_deals(source, ACTIVE, &properties, blueprint.crm.page_size)
            .await
            .unwrap();
        let ctx = DerivationContext::new(&blueprint.pipelines, &stages, &categories, now());

        let mut skipped = Vec::new();
        for partner in &blueprint.partners {
            let matched = filter_deals(&deals, ACTIVE, &partner.keyword);
            if matched.is_empty() {
                skipped.push(partner.keyword.clone());
                continue;
            }
            publisher.publish(&build_table(&matched, &ctx, partner)).await?;
        }
        publisher.close().await?;
        Ok(skipped)
    }

    fn col(column: BaseColumn) -> usize {
        BaseColumn::ALL.iter().position(|c| *c == column).unwrap()
    }

    /// End-to-end: MockCrmSource -> label tables -> fetch -> derive -> publish
    #[tokio::test]
    async fn test_e2e_mock_export() {
        let blueprint = blueprint();
        let source = crm();
        let sink = RecordingSink::default();
        let mut publisher = Publisher::new(vec![sink.clone()]);

        let skipped = export(&blueprint, &source, &mut publisher).await.unwrap();

        // three pages of two, two and one deal
        assert_eq!(source.search_calls(), 3);
        // the PostePay deal belongs to another pipeline
        assert_eq!(skipped, vec!["PostePay"]);
        assert_eq!(sink.sheets(), vec!["SmallPay", "Deutsche Bank", "Attitude"]);

        let smallpay = sink.table("SmallPay");
        assert_eq!(smallpay.rows.len(), 2);
        let physical = &smallpay.rows[0];
        let online = &smallpay.rows[1];

        assert_eq!(physical[col(BaseColumn::DealSize)].as_text(), Some("500.000 € - 1M €"));
        assert_eq!(online[col(BaseColumn::DealSize)].as_text(), Some("0 - 50.000 €"));
        assert_eq!(physical[col(BaseColumn::Amount)], CellValue::Number(30_000.0));
        assert_eq!(physical[col(BaseColumn::InstoreCategory)].as_text(), Some("Food & Beverage"));
        assert_eq!(physical[col(BaseColumn::Stage)].as_text(), Some("Onboarding Completed"));

        // legacy proposal stage ids are honored
        assert_eq!(
            physical[col(BaseColumn::DateEnteredProposal)].as_text(),
            Some("2024-05-01 08:00:00")
        );
        assert_eq!(physical[col(BaseColumn::HoursInProposal)], CellValue::Number(12.5));
        assert_eq!(physical[col(BaseColumn::MinutesInProposal)], CellValue::Number(750.0));

        // open interval measured against the injected clock
        assert_eq!(online[col(BaseColumn::HoursInProposal)], CellValue::Number(12.0));
        assert_eq!(online[col(BaseColumn::DateExitedProposal)], CellValue::Empty);
    }

    #[tokio::test]
    async fn test_e2e_partner_schemas() {
        let blueprint = blueprint();
        let sink = RecordingSink::default();
        let mut publisher = Publisher::new(vec![sink.clone()]);

        export(&blueprint, &crm(), &mut publisher).await.unwrap();

        let bank = sink.table("Deutsche Bank");
        assert_eq!(bank.headers.len(), 23);
        assert_eq!(bank.rows[0].len(), 23);
        // unknown stage ids fall back to the raw id
        assert_eq!(bank.rows[0][col(BaseColumn::Stage)].as_text(), Some("unknown-stage"));
        assert_eq!(bank.rows[0][20].as_text(), Some("agent@example.com"));
        assert_eq!(bank.rows[0][21].as_text(), Some("Gold"));
        assert_eq!(bank.rows[0][22], CellValue::Empty);

        let attitude = sink.table("Attitude");
        assert_eq!(attitude.rows[0].len(), 25);
        assert_eq!(
            attitude.rows[0][col(BaseColumn::DealSize)].as_text(),
            Some("Oltre 10M €")
        );
    }

    #[tokio::test]
    async fn test_e2e_publish_failure_keeps_earlier_partners() {
        let blueprint = blueprint();
        let sink = RecordingSink {
            fail_on: Some("Deutsche Bank".into()),
            ..RecordingSink::default()
        };
        let mut publisher = Publisher::new(vec![sink.clone()]);

        let err = export(&blueprint, &crm(), &mut publisher).await.unwrap_err();
        assert!(matches!(err, DispatcherError::Publish { ref sheet_name, .. } if sheet_name == "Deutsche Bank"));

        // SmallPay was written before the failure, Attitude never attempted
        assert_eq!(sink.sheets(), vec!["SmallPay"]);
    }

    #[tokio::test]
    async fn test_e2e_labels_degrade_when_crm_metadata_fails() {
        let blueprint = blueprint();
        let source = crm().fail_pipelines().fail_property_options();
        let sink = RecordingSink::default();
        let mut publisher = Publisher::new(vec![sink.clone()]);

        export(&blueprint, &source, &mut publisher).await.unwrap();

        let smallpay = sink.table("SmallPay");
        assert_eq!(smallpay.rows[0][col(BaseColumn::Stage)].as_text(), Some("2019816637"));
        assert_eq!(smallpay.rows[0][col(BaseColumn::InstoreCategory)].as_text(), Some("food"));
        // without labels the open-stage rule cannot fire
        assert_eq!(smallpay.rows[1][col(BaseColumn::HoursInProposal)], CellValue::Empty);
    }

    #[tokio::test]
    async fn test_e2e_file_sink_output() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint();
        let mut publisher = create_publisher(&[SinkConfig {
            name: "json".into(),
            sink_type: SinkType::File,
            params: HashMap::from([(
                "base_path".to_string(),
                dir.path().to_string_lossy().to_string(),
            )]),
        }])
        .await
        .unwrap();

        export(&blueprint, &crm(), &mut publisher).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("SmallPay.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["rows"][0][3], 30000.0);
        assert!(!dir.path().join("PostePay.json").exists());

        let metrics = publisher.metrics();
        assert_eq!(metrics[0].1.tables_published, 3);
        assert_eq!(metrics[0].1.rows_published, 4);
    }
}

//! Publisher - hands each partner table to the configured sinks, in order

use tracing::{error, info, instrument};

use contracts::{SheetSink, SheetTable, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{AnySink, FileSink, GoogleSheetsSink, LogSink};

/// Outcome of publishing one table to every sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    pub sheet_name: String,
    /// Data rows, header excluded
    pub rows: usize,
    /// (sink name, cells reported updated)
    pub sinks: Vec<(String, usize)>,
}

impl PublishSummary {
    /// Cells reported by the first sink, or 0 when none is configured
    pub fn updated_cells(&self) -> usize {
        self.sinks.first().map(|(_, cells)| *cells).unwrap_or(0)
    }
}

struct Entry<S> {
    sink: S,
    metrics: SinkMetrics,
}

/// Owns the sinks of a run
///
/// Publishing is sequential: a table goes to sink 1, then sink 2, and so on.
/// The first failure aborts the table; tables published earlier stay published.
pub struct Publisher<S> {
    entries: Vec<Entry<S>>,
}

impl<S: SheetSink> Publisher<S> {
    /// Create a publisher with already-built sinks
    pub fn new(sinks: Vec<S>) -> Self {
        Self {
            entries: sinks
                .into_iter()
                .map(|sink| Entry {
                    sink,
                    metrics: SinkMetrics::new(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.sink.name().to_string()).collect()
    }

    /// Publish one partner table to every sink
    #[instrument(
        name = "publisher_publish",
        skip(self, table),
        fields(sheet = %table.sheet_name, rows = table.rows.len(), sinks = self.entries.len())
    )]
    pub async fn publish(&mut self, table: &SheetTable) -> Result<PublishSummary, DispatcherError> {
        let mut summary = PublishSummary {
            sheet_name: table.sheet_name.clone(),
            rows: table.rows.len(),
            sinks: Vec::with_capacity(self.entries.len()),
        };

        for entry in &mut self.entries {
            match entry.sink.publish(table).await {
                Ok(receipt) => {
                    entry
                        .metrics
                        .record_published(table.rows.len(), receipt.updated_cells);
                    summary
                        .sinks
                        .push((entry.sink.name().to_string(), receipt.updated_cells));
                }
                Err(source) => {
                    entry.metrics.inc_failure_count();
                    error!(
                        sink = %entry.sink.name(),
                        sheet = %table.sheet_name,
                        error = %source,
                        "publish failed"
                    );
                    return Err(DispatcherError::Publish {
                        sink_name: entry.sink.name().to_string(),
                        sheet_name: table.sheet_name.clone(),
                        source,
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Close every sink; all are attempted, the first error is returned
    #[instrument(name = "publisher_close", skip(self))]
    pub async fn close(&mut self) -> Result<(), DispatcherError> {
        let mut first_error = None;
        for entry in &mut self.entries {
            if let Err(e) = entry.sink.close().await {
                error!(sink = %entry.sink.name(), error = %e, "close failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        info!(sinks = self.entries.len(), "Publisher closed");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.entries
            .iter()
            .map(|e| (e.sink.name().to_string(), e.metrics.snapshot()))
            .collect()
    }
}

/// Create a sink from configuration
#[instrument(
    name = "publisher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(config: &SinkConfig) -> Result<AnySink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(LogSink::new(&config.name).into()),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(sink.into())
        }
        SinkType::GoogleSheets => {
            let sink = GoogleSheetsSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(sink.into())
        }
    }
}

/// Convenience function to create a publisher from sink configs
#[instrument(name = "publisher_create", skip(sink_configs), fields(count = sink_configs.len()))]
pub async fn create_publisher(
    sink_configs: &[SinkConfig],
) -> Result<Publisher<AnySink>, DispatcherError> {
    let mut sinks = Vec::with_capacity(sink_configs.len());
    for config in sink_configs {
        sinks.push(create_sink(config).await?);
    }
    Ok(Publisher::new(sinks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CellValue, ContractError, PartnerKind, PublishReceipt};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Records every sheet it receives; optionally fails on one sheet name
    struct TestSink {
        name: String,
        fail_on: Option<String>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl SheetSink for TestSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
            if self.fail_on.as_deref() == Some(table.sheet_name.as_str()) {
                return Err(ContractError::sink_write(&self.name, "quota exceeded"));
            }
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, table.sheet_name));
            Ok(PublishReceipt {
                updated_cells: table.cell_count(),
            })
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn table(sheet: &str) -> SheetTable {
        SheetTable::new(
            sheet,
            sheet,
            PartnerKind::Default,
            vec![vec![CellValue::Empty; 20]; 2],
        )
    }

    #[tokio::test]
    async fn test_publish_to_sinks_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sinks = vec![
            TestSink { name: "a".into(), fail_on: None, seen: seen.clone() },
            TestSink { name: "b".into(), fail_on: None, seen: seen.clone() },
        ];
        let mut publisher = Publisher::new(sinks);

        let summary = publisher.publish(&table("SmallPay")).await.unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.updated_cells(), 60);
        assert_eq!(
            summary.sinks,
            vec![("a".to_string(), 60), ("b".to_string(), 60)]
        );
        assert_eq!(*seen.lock().unwrap(), vec!["a:SmallPay", "b:SmallPay"]);
        assert!(publisher.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sinks = vec![
            TestSink { name: "a".into(), fail_on: Some("PostePay".into()), seen: seen.clone() },
            TestSink { name: "b".into(), fail_on: None, seen: seen.clone() },
        ];
        let mut publisher = Publisher::new(sinks);

        publisher.publish(&table("SmallPay")).await.unwrap();
        let err = publisher.publish(&table("PostePay")).await.unwrap_err();
        match err {
            DispatcherError::Publish { sink_name, sheet_name, .. } => {
                assert_eq!(sink_name, "a");
                assert_eq!(sheet_name, "PostePay");
            }
            other => panic!("unexpected error: {other}"),
        }

        // sink b never saw the failed table
        assert_eq!(*seen.lock().unwrap(), vec!["a:SmallPay", "b:SmallPay"]);

        let metrics: HashMap<_, _> = publisher.metrics().into_iter().collect();
        assert_eq!(metrics["a"].tables_published, 1);
        assert_eq!(metrics["a"].failure_count, 1);
        assert_eq!(metrics["b"].tables_published, 1);
    }

    #[tokio::test]
    async fn test_create_publisher_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let configs = vec![
            SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "json".to_string(),
                sink_type: SinkType::File,
                params: HashMap::from([(
                    "base_path".to_string(),
                    dir.path().to_string_lossy().to_string(),
                )]),
            },
        ];

        let mut publisher = create_publisher(&configs).await.unwrap();
        assert_eq!(publisher.sink_names(), vec!["log", "json"]);

        publisher.publish(&table("Attitude")).await.unwrap();
        assert!(dir.path().join("Attitude.json").exists());
    }

    #[tokio::test]
    async fn test_google_sheets_creation_error() {
        let configs = vec![SinkConfig {
            name: "sheets".to_string(),
            sink_type: SinkType::GoogleSheets,
            params: HashMap::from([
                ("spreadsheet_id".to_string(), "abc".to_string()),
                ("token_file".to_string(), "/nonexistent/token.json".to_string()),
            ]),
        }];

        let err = create_publisher(&configs).await.err().unwrap();
        assert!(matches!(err, DispatcherError::SinkCreation { .. }));
    }
}

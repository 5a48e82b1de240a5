//! LogSink - logs table summary via tracing

use contracts::{ContractError, PublishReceipt, SheetSink, SheetTable};
use tracing::{debug, info, instrument};

/// Sink that logs table summaries, for dry runs and debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_table_summary(&self, table: &SheetTable) {
        info!(
            sink = %self.name,
            sheet = %table.sheet_name,
            partner = %table.partner_keyword,
            rows = table.rows.len(),
            columns = table.headers.len(),
            formats = table.formats.len(),
            "SheetTable received"
        );

        if let Some(first) = table.rows.first() {
            debug!(sink = %self.name, sheet = %table.sheet_name, row = ?first, "first row");
        }
    }
}

impl SheetSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_publish",
        skip(self, table),
        fields(sink = %self.name, sheet = %table.sheet_name)
    )]
    async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
        self.log_table_summary(table);
        Ok(PublishReceipt {
            updated_cells: table.cell_count(),
        })
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

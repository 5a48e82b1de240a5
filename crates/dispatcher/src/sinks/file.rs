//! FileSink - writes one JSON document per sheet

use contracts::{ContractError, PublishReceipt, SheetSink, SheetTable};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Sink that writes `<base_path>/<sheet_name>.json`, replacing it every run
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
        })
    }

    /// Create from a sink params map, as `create_sink` does
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Output path of a sheet
    pub fn sheet_path(&self, sheet_name: &str) -> PathBuf {
        let file_name: String = sheet_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.config.base_path.join(format!("{file_name}.json"))
    }

    fn write_table_to_disk(&self, table: &SheetTable) -> std::io::Result<PathBuf> {
        let path = self.sheet_path(&table.sheet_name);
        let tmp = path.with_extension("json.tmp");

        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, table)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    fn persist_table(&self, table: &SheetTable) -> Result<PathBuf, ContractError> {
        self.write_table_to_disk(table).map_err(|e| {
            error!(sink = %self.name, sheet = %table.sheet_name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl SheetSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_publish",
        skip(self, table),
        fields(sink = %self.name, sheet = %table.sheet_name)
    )]
    async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
        let path = self.persist_table(table)?;
        debug!(path = %path.display(), rows = table.rows.len(), "sheet written");
        Ok(PublishReceipt {
            updated_cells: table.cell_count(),
        })
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

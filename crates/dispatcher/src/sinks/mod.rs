//! Sink implementations
//!
//! Contains LogSink, FileSink and GoogleSheetsSink, plus `AnySink` which lets
//! a configured mix of them live in one `Publisher`.

mod file;
mod google_sheets;
mod log;

use contracts::{ContractError, PublishReceipt, SheetSink, SheetTable};

pub use self::file::{FileSink, FileSinkConfig};
pub use self::google_sheets::{
    a1_range, format_requests, AuthorizedUser, GoogleSheetsConfig, GoogleSheetsSink,
};
pub use self::log::LogSink;

/// Any of the built-in sinks
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    GoogleSheets(GoogleSheetsSink),
}

impl From<LogSink> for AnySink {
    fn from(sink: LogSink) -> Self {
        Self::Log(sink)
    }
}

impl From<FileSink> for AnySink {
    fn from(sink: FileSink) -> Self {
        Self::File(sink)
    }
}

impl From<GoogleSheetsSink> for AnySink {
    fn from(sink: GoogleSheetsSink) -> Self {
        Self::GoogleSheets(sink)
    }
}

impl SheetSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
            Self::GoogleSheets(s) => s.name(),
        }
    }

    async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError> {
        match self {
            Self::Log(s) => s.publish(table).await,
            Self::File(s) => s.publish(table).await,
            Self::GoogleSheets(s) => s.publish(table).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.close().await,
            Self::File(s) => s.close().await,
            Self::GoogleSheets(s) => s.close().await,
        }
    }
}

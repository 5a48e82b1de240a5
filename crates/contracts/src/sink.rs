//! SheetSink trait - Sheet Publisher output interface
//!
//! Defines the abstract interface for publishing destinations.

use crate::{ContractError, PublishReceipt, SheetTable};

/// Destination for per-partner tables
///
/// All sink implementations must implement this trait.
#[trait_variant::make(SheetSink: Send)]
pub trait LocalSheetSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Replace the content of `table.sheet_name` with the table
    ///
    /// The destination is fully cleared before the header and rows are
    /// written; number formats apply to data rows only.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn publish(&mut self, table: &SheetTable) -> Result<PublishReceipt, ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}

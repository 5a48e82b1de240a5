//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the deal exporter.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `Deal`: sparse property snapshot of one CRM record, immutable for a run
//! - `LabelTable`: stage / category id -> label, built once per run, read-only
//! - `PipelineDefinition`: one historical pipeline configuration and its stage ids
//! - `PartnerSpec` / `PartnerKind`: configured destination and extra-column schema
//! - `SheetTable`: header row + output rows + number formats for one partner

mod blueprint;
mod columns;
mod crm_source;
mod deal;
mod error;
mod labels;
pub mod properties;
mod sheet;
mod sink;

pub use blueprint::*;
pub use columns::*;
pub use crm_source::CrmSource;
pub use deal::*;
pub use error::*;
pub use labels::*;
pub use properties::*;
pub use sheet::*;
pub use sink::SheetSink;

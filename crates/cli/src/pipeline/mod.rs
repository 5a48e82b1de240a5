//! Export orchestration and scheduling.

mod orchestrator;
mod schedule;

pub use orchestrator::Exporter;
pub use schedule::{next_trigger, parse_schedule, run_scheduled};

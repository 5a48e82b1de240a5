//! # Transform
//!
//! Partner filtering and per-deal metric derivation.
//!
//! Everything here is a pure function over already-fetched deals and the
//! run's label tables:
//! - `filter`: partner keyword + active pipeline selection
//! - `normalize`: timestamps, locale-flexible numbers, ms -> minutes
//! - `timing`: hours spent in the proposal stage
//! - `sizing`: deal size buckets
//! - `deriver`: row assembly per partner schema
//!
//! ## Usage Example
//!
//! ```ignore
//! use transform::{build_table, filter_deals, DerivationContext};
//!
//! let ctx = DerivationContext::new(&blueprint.pipelines, &stages, &categories, Utc::now());
//! let matched = filter_deals(&deals, &blueprint.crm.active_pipeline_id, &partner.keyword);
//! let table = build_table(&matched, &ctx, partner);
//! ```

pub mod deriver;
pub mod filter;
pub mod lookup;
pub mod normalize;
pub mod sizing;
pub mod timing;

// Re-exports
pub use deriver::{build_table, derive, DerivationContext};
pub use filter::{filter_deals, matches_partner};
pub use lookup::get_first_value;
pub use normalize::{
    format_timestamp, ms_to_minutes, parse_number, parse_timestamp, round2, Timestamp,
};
pub use sizing::{classify_amount, classify_deal_size, DealSize};
pub use timing::elapsed_hours;

//! # Ingestion
//!
//! CRM data ingestion module.
//!
//! Responsibilities:
//! - Resolve stage and category label tables (degrading to empty tables)
//! - Fetch every deal of the active pipeline via cursor pagination
//! - Provide the HubSpot and in-memory `CrmSource` implementations
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{fetch_deals, requested_properties, resolve_stage_labels, HubSpotClient};
//!
//! let client = HubSpotClient::from_config(&blueprint.crm)?;
//! let stages = resolve_stage_labels(&client).await;
//! let properties = requested_properties(&blueprint.pipelines);
//! let deals = fetch_deals(&client, "1347411134", &properties, 100).await?;
//! ```

mod error;
mod fetcher;
mod hubspot;
mod label_resolver;
mod mock;

// Re-exports
pub use contracts::{CrmSource, Deal};
pub use error::{IngestionError, Result};
pub use fetcher::{fetch_deals, requested_properties};
pub use hubspot::{search_body, HubSpotClient};
pub use label_resolver::{resolve_category_labels, resolve_stage_labels};
pub use mock::MockCrmSource;

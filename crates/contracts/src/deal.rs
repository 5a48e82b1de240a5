//! Deal - Record Fetcher output
//!
//! Sparse property snapshot of one CRM record plus the paging types used to
//! retrieve them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One CRM deal.
///
/// Properties are sparse: an absent key means "no data", never an error.
/// Properties reported as JSON `null` are dropped at deserialization time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Stable record identifier
    pub id: String,

    /// Property name -> raw string value
    #[serde(default, deserialize_with = "deserialize_sparse")]
    pub properties: HashMap<String, String>,
}

impl Deal {
    /// Create a deal from an id and `(name, value)` pairs
    pub fn new<I, K, V>(id: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: id.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw property value, `None` when absent
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Raw property value, empty string when absent
    pub fn value(&self, name: &str) -> &str {
        self.property(name).unwrap_or("")
    }

    /// Property value only if present and non-empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.property(name).filter(|v| !v.is_empty())
    }
}

fn deserialize_sparse<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

/// Search request for one page of deals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealSearchRequest {
    /// Pipeline filter (exact match on the `pipeline` property)
    pub pipeline_id: String,

    /// Properties to return on every deal
    pub properties: Vec<String>,

    /// Page size
    pub limit: u32,

    /// Opaque continuation cursor, `None` for the first page
    pub after: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealPage {
    /// Deals in this page (may be fewer than the requested limit)
    pub results: Vec<Deal>,

    /// Cursor for the next page, `None` when the server reported no next page
    pub next_after: Option<String>,
}

impl DealPage {
    /// Cursor to continue with, treating an empty cursor as absent
    pub fn continuation(&self) -> Option<&str> {
        self.next_after.as_deref().filter(|c| !c.is_empty())
    }
}

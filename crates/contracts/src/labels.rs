//! Label tables - Label Resolver output
//!
//! Immutable id -> label mappings built once per run and passed by reference
//! to every derivation call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A pipeline as reported by the CRM, with its stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStages {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub stages: Vec<StageOption>,
}

/// One stage of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOption {
    pub id: String,
    pub label: String,
}

/// One enumeration option of a CRM property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub value: String,
    pub label: String,
}

/// Read-only id -> label mapping
///
/// Lookups of unknown ids fall back to the raw id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    entries: HashMap<String, String>,
}

/// Stage id -> stage label
pub type StageLabelTable = LabelTable;

/// Category code -> category label
pub type CategoryLabelTable = LabelTable;

impl LabelTable {
    /// Empty table; every lookup falls back to the raw id
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(id, label)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = HashMap::new();
        for (id, label) in pairs {
            entries.insert(id.into(), label.into());
        }
        Self { entries }
    }

    /// Flatten pipelines -> stages into a stage table
    pub fn from_pipelines(pipelines: &[PipelineStages]) -> Self {
        Self::from_pairs(
            pipelines
                .iter()
                .flat_map(|p| p.stages.iter())
                .map(|s| (s.id.as_str(), s.label.as_str())),
        )
    }

    /// Flatten property options into a category table
    pub fn from_options(options: &[PropertyOption]) -> Self {
        Self::from_pairs(options.iter().map(|o| (o.value.as_str(), o.label.as_str())))
    }

    /// Label for `id`, or `id` itself when unknown
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

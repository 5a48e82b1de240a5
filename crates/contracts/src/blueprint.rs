//! ExportBlueprint - Config Loader output
//!
//! Describes a complete export: CRM access, pipeline history, partners,
//! output sinks and the recurring schedule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::PartnerKind;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// CRM access and query settings
    pub crm: CrmConfig,

    /// Historical pipeline configurations, in lookup order
    pub pipelines: Vec<PipelineDefinition>,

    /// Partners to export, in publish order
    pub partners: Vec<PartnerSpec>,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Recurring run settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// CRM settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// API base URL
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,

    /// Environment variable holding the private-app token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// The only pipeline fetched and accepted by the partner filter
    pub active_pipeline_id: String,

    /// Property whose options label the category column
    #[serde(default = "default_category_property")]
    pub category_property: String,

    /// Search page size
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_crm_base_url() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_token_env() -> String {
    "HUBSPOT_API_TOKEN".to_string()
}

fn default_category_property() -> String {
    "instore_category".to_string()
}

fn default_page_size() -> u32 {
    100
}

/// One pipeline configuration and its tracked stage ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Name used in logs
    pub name: String,

    /// Pipeline id
    pub pipeline_id: String,

    /// Stage id of "Proposal sent"
    pub proposal_sent: String,

    /// Stage id of "KYC Pending Approval"
    pub kyc_pending: String,

    /// Stage id of "Onboarding Completed"
    pub onboarding_completed: String,
}

/// Tracked stage roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageRole {
    ProposalSent,
    KycPending,
    OnboardingCompleted,
}

impl PipelineDefinition {
    /// Stage id playing `role` in this pipeline
    pub fn stage_id(&self, role: StageRole) -> &str {
        match role {
            StageRole::ProposalSent => &self.proposal_sent,
            StageRole::KycPending => &self.kyc_pending,
            StageRole::OnboardingCompleted => &self.onboarding_completed,
        }
    }
}

/// Stage ids for `role` across all definitions, in declared order
pub fn stage_ids(pipelines: &[PipelineDefinition], role: StageRole) -> Vec<&str> {
    pipelines.iter().map(|p| p.stage_id(role)).collect()
}

/// One partner destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSpec {
    /// Case-insensitive substring matched against the partner-name property
    pub keyword: String,

    /// Destination sheet name
    pub sheet_name: String,

    /// Column schema; derived from the exact keyword when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PartnerKind>,
}

impl PartnerSpec {
    pub fn new(keyword: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            sheet_name: sheet_name.into(),
            kind: None,
        }
    }

    /// Effective column schema
    pub fn kind(&self) -> PartnerKind {
        self.kind
            .unwrap_or_else(|| PartnerKind::from_keyword(&self.keyword))
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log summary output
    Log,
    /// JSON files on disk
    File,
    /// Google Sheets spreadsheet
    GoogleSheets,
}

/// Recurring run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression evaluated in local time
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
        }
    }
}

fn default_cron() -> String {
    // daily at 05:05
    "0 5 5 * * *".to_string()
}

impl ExportBlueprint {
    /// Partner specs, optionally restricted to the given keywords
    pub fn selected_partners<'a>(&'a self, only: &'a [String]) -> impl Iterator<Item = &'a PartnerSpec> {
        self.partners
            .iter()
            .filter(move |p| only.is_empty() || only.iter().any(|k| k == &p.keyword))
    }

    /// Pipeline definition for the active pipeline id, if declared
    pub fn active_pipeline(&self) -> Option<&PipelineDefinition> {
        self.pipelines
            .iter()
            .find(|p| p.pipeline_id == self.crm.active_pipeline_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(name: &str, id: &str, prefix: &str) -> PipelineDefinition {
        PipelineDefinition {
            name: name.into(),
            pipeline_id: id.into(),
            proposal_sent: format!("{prefix}1"),
            kyc_pending: format!("{prefix}2"),
            onboarding_completed: format!("{prefix}3"),
        }
    }

    fn sample_blueprint() -> ExportBlueprint {
        ExportBlueprint {
            version: ConfigVersion::V1,
            crm: CrmConfig {
                base_url: default_crm_base_url(),
                token_env: default_token_env(),
                active_pipeline_id: "100".into(),
                category_property: default_category_property(),
                page_size: 100,
            },
            pipelines: vec![pipeline("legacy", "90", "a"), pipeline("partnership", "100", "b")],
            partners: vec![
                PartnerSpec::new("Smallpay", "SmallPay"),
                PartnerSpec::new("Attitude", "Attitude"),
            ],
            sinks: vec![],
            schedule: ScheduleConfig::default(),
        }
    }

    #[test]
    fn stage_ids_follow_declared_order() {
        let bp = sample_blueprint();
        assert_eq!(stage_ids(&bp.pipelines, StageRole::KycPending), vec!["a2", "b2"]);
        assert_eq!(
            stage_ids(&bp.pipelines, StageRole::ProposalSent),
            vec!["a1", "b1"]
        );
    }

    #[test]
    fn partner_kind_defaults_from_keyword() {
        let bp = sample_blueprint();
        assert_eq!(bp.partners[0].kind(), PartnerKind::Default);
        assert_eq!(bp.partners[1].kind(), PartnerKind::Attitude);

        let mut explicit = PartnerSpec::new("DB Italia", "DB");
        explicit.kind = Some(PartnerKind::DeutscheBank);
        assert_eq!(explicit.kind(), PartnerKind::DeutscheBank);
    }

    #[test]
    fn selected_partners_filters_exact_keywords() {
        let bp = sample_blueprint();
        assert_eq!(bp.selected_partners(&[]).count(), 2);
        let only = vec!["Attitude".to_string()];
        let selected: Vec<_> = bp.selected_partners(&only).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].sheet_name, "Attitude");
    }

    #[test]
    fn active_pipeline_lookup() {
        let bp = sample_blueprint();
        assert_eq!(bp.active_pipeline().map(|p| p.name.as_str()), Some("partnership"));
    }

    #[test]
    fn schedule_defaults_to_daily_early_morning() {
        assert_eq!(ScheduleConfig::default().cron, "0 5 5 * * *");
    }
}

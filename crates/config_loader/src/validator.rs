//! Configuration validation
//!
//! Rules:
//! - at least one pipeline; pipeline names unique; stage ids non-empty
//! - active_pipeline_id declared by a pipeline
//! - 1 <= page_size <= 100
//! - at least one partner; keywords and sheet names unique and non-empty
//! - sink names non-empty
//! - schedule cron expression parses

use std::collections::HashSet;
use std::str::FromStr;

use contracts::{ContractError, ExportBlueprint, PartnerSpec, StageRole};

/// Largest page size the search endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validate an ExportBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    validate_pipelines(blueprint)?;
    validate_crm(blueprint)?;
    validate_partners(blueprint)?;
    validate_sinks(blueprint)?;
    validate_schedule(blueprint)?;
    Ok(())
}

fn validate_pipelines(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    if blueprint.pipelines.is_empty() {
        return Err(ContractError::config_validation(
            "pipelines",
            "at least one pipeline definition is required",
        ));
    }

    let mut seen = HashSet::new();
    for pipeline in &blueprint.pipelines {
        if !seen.insert(&pipeline.name) {
            return Err(ContractError::config_validation(
                format!("pipelines[name={}]", pipeline.name),
                "duplicate pipeline name",
            ));
        }
        if pipeline.pipeline_id.is_empty() {
            return Err(ContractError::config_validation(
                format!("pipelines[{}].pipeline_id", pipeline.name),
                "pipeline_id cannot be empty",
            ));
        }
        for (role, field) in [
            (StageRole::ProposalSent, "proposal_sent"),
            (StageRole::KycPending, "kyc_pending"),
            (StageRole::OnboardingCompleted, "onboarding_completed"),
        ] {
            if pipeline.stage_id(role).is_empty() {
                return Err(ContractError::config_validation(
                    format!("pipelines[{}].{}", pipeline.name, field),
                    "stage id cannot be empty",
                ));
            }
        }
    }
    Ok(())
}

fn validate_crm(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    let crm = &blueprint.crm;

    if blueprint.active_pipeline().is_none() {
        return Err(ContractError::config_validation(
            "crm.active_pipeline_id",
            format!(
                "active_pipeline_id '{}' not found in any pipeline definition",
                crm.active_pipeline_id
            ),
        ));
    }

    if crm.page_size == 0 || crm.page_size > MAX_PAGE_SIZE {
        return Err(ContractError::config_validation(
            "crm.page_size",
            format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                crm.page_size
            ),
        ));
    }

    if crm.category_property.is_empty() {
        return Err(ContractError::config_validation(
            "crm.category_property",
            "category_property cannot be empty",
        ));
    }
    Ok(())
}

fn validate_partners(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    if blueprint.partners.is_empty() {
        return Err(ContractError::config_validation(
            "partners",
            "at least one partner is required",
        ));
    }

    let mut keywords = HashSet::new();
    let mut sheets = HashSet::new();
    for (idx, partner) in blueprint.partners.iter().enumerate() {
        if partner.keyword.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("partners[{idx}].keyword"),
                "partner keyword cannot be empty",
            ));
        }
        if partner.sheet_name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("partners[{idx}].sheet_name"),
                "sheet name cannot be empty",
            ));
        }
        if !keywords.insert(partner.keyword.to_lowercase()) {
            return Err(ContractError::config_validation(
                format!("partners[keyword={}]", partner.keyword),
                "duplicate partner keyword",
            ));
        }
        if !sheets.insert(&partner.sheet_name) {
            return Err(ContractError::config_validation(
                format!("partners[sheet_name={}]", partner.sheet_name),
                "duplicate sheet name",
            ));
        }
    }
    Ok(())
}

fn validate_sinks(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_schedule(blueprint: &ExportBlueprint) -> Result<(), ContractError> {
    cron::Schedule::from_str(&blueprint.schedule.cron).map_err(|e| {
        ContractError::config_validation(
            "schedule.cron",
            format!("invalid cron expression '{}': {e}", blueprint.schedule.cron),
        )
    })?;
    Ok(())
}

/// Pairs of partner keywords where one is a case-insensitive substring of the other.
///
/// Such partners can both match the same deal.
pub fn overlapping_keywords(partners: &[PartnerSpec]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, a) in partners.iter().enumerate() {
        for b in &partners[i + 1..] {
            let (la, lb) = (a.keyword.to_lowercase(), b.keyword.to_lowercase());
            if la.contains(&lb) || lb.contains(&la) {
                pairs.push((a.keyword.clone(), b.keyword.clone()));
            }
        }
    }
    pairs
}

//! `info` command implementation.

use anyhow::{Context, Result};
use chrono::Local;
use contracts::{ExportBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::pipeline::{next_trigger, parse_schedule};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    crm: CrmInfo,
    pipelines: Vec<PipelineInfo>,
    partners: Vec<PartnerInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    schedule: ScheduleInfo,
}

#[derive(Serialize)]
struct CrmInfo {
    base_url: String,
    token_env: String,
    active_pipeline_id: String,
    category_property: String,
    page_size: u32,
}

#[derive(Serialize)]
struct PipelineInfo {
    name: String,
    pipeline_id: String,
    active: bool,
    proposal_sent: String,
    kyc_pending: String,
    onboarding_completed: String,
}

#[derive(Serialize)]
struct PartnerInfo {
    keyword: String,
    sheet_name: String,
    kind: String,
    columns: usize,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

#[derive(Serialize)]
struct ScheduleInfo {
    cron: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_trigger: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn sink_type_name(sink_type: SinkType) -> &'static str {
    match sink_type {
        SinkType::Log => "log",
        SinkType::File => "file",
        SinkType::GoogleSheets => "google_sheets",
    }
}

fn build_config_info(blueprint: &ExportBlueprint) -> Result<ConfigInfo> {
    let schedule = parse_schedule(&blueprint.schedule.cron)?;
    let next = next_trigger(&schedule, Local::now());

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        crm: CrmInfo {
            base_url: blueprint.crm.base_url.clone(),
            token_env: blueprint.crm.token_env.clone(),
            active_pipeline_id: blueprint.crm.active_pipeline_id.clone(),
            category_property: blueprint.crm.category_property.clone(),
            page_size: blueprint.crm.page_size,
        },
        pipelines: blueprint
            .pipelines
            .iter()
            .map(|p| PipelineInfo {
                name: p.name.clone(),
                pipeline_id: p.pipeline_id.clone(),
                active: p.pipeline_id == blueprint.crm.active_pipeline_id,
                proposal_sent: p.proposal_sent.clone(),
                kyc_pending: p.kyc_pending.clone(),
                onboarding_completed: p.onboarding_completed.clone(),
            })
            .collect(),
        partners: blueprint
            .partners
            .iter()
            .map(|p| PartnerInfo {
                keyword: p.keyword.clone(),
                sheet_name: p.sheet_name.clone(),
                kind: format!("{:?}", p.kind()),
                columns: p.kind().column_count(),
            })
            .collect(),
        sinks: blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: sink_type_name(s.sink_type).to_string(),
            })
            .collect(),
        schedule: ScheduleInfo {
            cron: blueprint.schedule.cron.clone(),
            next_trigger: next.map(|t| t.format("%Y-%m-%d %H:%M:%S %:z").to_string()),
        },
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Deal Exporter Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nCRM:");
    println!("  Base URL: {}", info.crm.base_url);
    println!("  Token env: {}", info.crm.token_env);
    println!("  Active pipeline: {}", info.crm.active_pipeline_id);
    println!("  Category property: {}", info.crm.category_property);
    println!("  Page size: {}", info.crm.page_size);

    println!("\nPipelines ({}):", info.pipelines.len());
    for p in &info.pipelines {
        let marker = if p.active { " [active]" } else { "" };
        println!("  - {} ({}){}", p.name, p.pipeline_id, marker);
        println!("      proposal sent:        {}", p.proposal_sent);
        println!("      kyc pending:          {}", p.kyc_pending);
        println!("      onboarding completed: {}", p.onboarding_completed);
    }

    println!("\nPartners ({}):", info.partners.len());
    for p in &info.partners {
        println!(
            "  - {} -> '{}' ({}, {} columns)",
            p.keyword, p.sheet_name, p.kind, p.columns
        );
    }

    if info.sinks.is_empty() {
        println!("\nSinks: none");
    } else {
        println!("\nSinks ({}):", info.sinks.len());
        for s in &info.sinks {
            println!("  - {} ({})", s.name, s.sink_type);
        }
    }

    println!("\nSchedule: {}", info.schedule.cron);
    if let Some(ref next) = info.schedule.next_trigger {
        println!("  Next trigger: {}", next);
    }
    println!();
}

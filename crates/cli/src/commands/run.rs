//! `run` command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use contracts::ExportBlueprint;
use ingestion::HubSpotClient;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{parse_schedule, run_scheduled, Exporter};

/// Execute the `run` command
pub async fn run_export_command(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        pipeline = %blueprint.crm.active_pipeline_id,
        pipelines = blueprint.pipelines.len(),
        partners = blueprint.partners.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    let exporter = Exporter::new(&blueprint, &args.partners)?;

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, &exporter);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::serve_metrics(args.metrics_port)?;
    }

    let client = HubSpotClient::from_config(&blueprint.crm).context("Failed to create CRM client")?;
    info!(base_url = %client.base_url(), "CRM client ready");

    let run_once = || async {
        exporter
            .run(
                &client,
                || dispatcher::create_publisher(&blueprint.sinks),
                Utc::now(),
            )
            .await
    };

    if args.schedule {
        let schedule = parse_schedule(&blueprint.schedule.cron)?;
        info!(cron = %blueprint.schedule.cron, "Scheduled mode, running now and on every trigger");
        let history = run_scheduled(&schedule, run_once, shutdown_signal()).await;
        println!("{history}");
        return Ok(());
    }

    let started = std::time::Instant::now();
    tokio::select! {
        result = run_once() => {
            match result {
                Ok(stats) => {
                    observability::record_run(true, stats.duration);
                    println!("\n{stats}");
                }
                Err(e) => {
                    observability::record_run(false, started.elapsed());
                    return Err(e).context("Export run failed");
                }
            }
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping export...");
        }
    }

    info!("Deal exporter finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ExportBlueprint, exporter: &Exporter<'_>) {
    println!("\n=== Configuration Summary ===\n");
    println!("CRM:");
    println!("  Base URL: {}", blueprint.crm.base_url);
    println!("  Token env: {}", blueprint.crm.token_env);
    println!("  Active pipeline: {}", blueprint.crm.active_pipeline_id);
    println!("  Page size: {}", blueprint.crm.page_size);

    println!("\nPipelines ({}):", blueprint.pipelines.len());
    for pipeline in &blueprint.pipelines {
        println!(
            "  - {} ({}) proposal={} kyc={} onboarding={}",
            pipeline.name,
            pipeline.pipeline_id,
            pipeline.proposal_sent,
            pipeline.kyc_pending,
            pipeline.onboarding_completed
        );
    }

    println!("\nPartners to export ({}):", exporter.partners().len());
    for partner in exporter.partners() {
        println!(
            "  - {} -> '{}' ({:?}, {} columns)",
            partner.keyword,
            partner.sheet_name,
            partner.kind(),
            partner.kind().column_count()
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!("\nSchedule: {}", blueprint.schedule.cron);
    println!();
}

//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ExportBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    active_pipeline_id: String,
    pipeline_count: usize,
    partner_count: usize,
    sink_count: usize,
    schedule: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    active_pipeline_id: blueprint.crm.active_pipeline_id.clone(),
                    pipeline_count: blueprint.pipelines.len(),
                    partner_count: blueprint.partners.len(),
                    sink_count: blueprint.sinks.len(),
                    schedule: blueprint.schedule.cron.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ExportBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - tables will be derived but not published".to_string());
    }

    // A deal matching both keywords lands in both sheets
    for (a, b) in config_loader::overlapping_keywords(&blueprint.partners) {
        warnings.push(format!(
            "Partner keywords '{a}' and '{b}' overlap - matching deals appear in both sheets"
        ));
    }

    for pipeline in &blueprint.pipelines {
        if pipeline.pipeline_id != blueprint.crm.active_pipeline_id {
            warnings.push(format!(
                "Pipeline '{}' ({}) is not active - only its stage ids are used for history lookups",
                pipeline.name, pipeline.pipeline_id
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Active pipeline: {}", summary.active_pipeline_id);
            println!("  Pipelines: {}", summary.pipeline_count);
            println!("  Partners: {}", summary.partner_count);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Schedule: {}", summary.schedule);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[crm]
active_pipeline_id = "1347411134"

[[pipelines]]
name = "legacy"
pipeline_id = "900"
proposal_sent = "p1"
kyc_pending = "k1"
onboarding_completed = "o1"

[[pipelines]]
name = "partnership"
pipeline_id = "1347411134"
proposal_sent = "p2"
kyc_pending = "k2"
onboarding_completed = "o2"

[[partners]]
keyword = "Pay"
sheet_name = "Pay"

[[partners]]
keyword = "PostePay"
sheet_name = "PostePay"
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(CONFIG);
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid, "error: {:?}", result.error);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.starts_with("No sinks configured")));
        assert!(warnings.iter().any(|w| w.contains("'Pay' and 'PostePay' overlap")));
        assert!(warnings.iter().any(|w| w.contains("'legacy' (900) is not active")));
        assert_eq!(result.summary.unwrap().partner_count, 2);
    }

    #[test]
    fn test_invalid_config() {
        let broken = CONFIG.replacen(
            "active_pipeline_id = \"1347411134\"",
            "active_pipeline_id = \"42\"",
            1,
        );
        let file = write_config(&broken);
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/config.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().starts_with("File not found"));
    }
}

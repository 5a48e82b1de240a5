//! # Config Loader
//!
//! Reads the exporter configuration (CRM connection, pipeline history,
//! partners, sinks, schedule) from a TOML or JSON file, fills defaults and
//! validates it into an `ExportBlueprint`.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! for partner in &blueprint.partners {
//!     println!("{} -> {}", partner.keyword, partner.sheet_name);
//! }
//! ```

mod parser;
mod validator;

pub use contracts::ExportBlueprint;
pub use parser::ConfigFormat;
pub use validator::{overlapping_keywords, MAX_PAGE_SIZE};

use contracts::ContractError;
use std::path::Path;

/// Entry point for loading an `ExportBlueprint`
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a `.toml` or `.json` file
    ///
    /// # Errors
    /// Unknown extension, unreadable file, parse failure or the first
    /// validation rule broken.
    pub fn load_from_path(path: &Path) -> Result<ExportBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate in-memory content
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ExportBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Render a blueprint back to TOML, defaults included
    pub fn to_toml(blueprint: &ExportBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[crm]
active_pipeline_id = "1347411134"

[[pipelines]]
name = "partnership"
pipeline_id = "1347411134"
proposal_sent = "1834011865"
kyc_pending = "1834011866"
onboarding_completed = "2019816637"

[[partners]]
keyword = "Smallpay"
sheet_name = "SmallPay"

[[partners]]
keyword = "Attitude"
sheet_name = "Attitude"

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.crm.active_pipeline_id, "1347411134");
        assert_eq!(bp.partners.len(), 2);
    }

    #[test]
    fn test_defaults_survive_toml_rendering() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let rendered = ConfigLoader::to_toml(&bp).unwrap();
        assert!(rendered.contains("page_size = 100"));

        let reloaded = ConfigLoader::load_from_str(&rendered, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.pipelines, reloaded.pipelines);
        assert_eq!(bp.partners, reloaded.partners);
        assert_eq!(bp.schedule, reloaded.schedule);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.sinks[0].name, "log_sink");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // active pipeline not declared by any definition
        let content = MINIMAL_TOML.replace(
            "active_pipeline_id = \"1347411134\"",
            "active_pipeline_id = \"42\"",
        );
        let err = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("export.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}

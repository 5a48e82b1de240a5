//! # Observability
//!
//! Tracing initialization, Prometheus export and run summaries.
//!
//! ## Usage Example
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     default_log_level: "debug".to_string(),
//!     force_level: false,
//! })?;
//! observability::serve_metrics(9000)?;
//!
//! let mut history = RunHistory::new();
//! history.record(stats.published() > 0, stats.duration);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub use crate::metrics::{
    record_partner_skipped, record_rows_published, record_run, PartnerOutcome, PartnerStatus,
    RunHistory, RunStats, RunningStats, StatsSummary,
};

/// Logging settings chosen by the binary
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Filter used when RUST_LOG is unset
    pub default_log_level: String,
    /// Ignore RUST_LOG and always use `default_log_level` (`--quiet`)
    pub force_level: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            default_log_level: "info".to_string(),
            force_level: false,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, carrying the current span
    Json,
    Pretty,
    #[default]
    Compact,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl ObservabilityConfig {
    fn env_filter(&self) -> EnvFilter {
        if self.force_level {
            return EnvFilter::new(&self.default_log_level);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }

    fn fmt_layer(&self) -> BoxedLayer {
        let filter = self.env_filter();
        match self.log_format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer().pretty().with_filter(filter).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_filter(filter).boxed(),
        }
    }
}

/// Install the global tracing subscriber
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        forced = config.force_level,
        "Logging initialized"
    );
    Ok(())
}

/// Install the Prometheus recorder with an HTTP listener on `0.0.0.0:port`
///
/// Every `deal_exporter_*` counter, gauge and histogram recorded afterwards is
/// scraped from `/metrics`.
pub fn serve_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on port {port}"))?;

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}

//! Export run metrics
//!
//! Facade counters for Prometheus plus in-memory aggregates printed at the
//! end of a run (`RunStats`) and of a scheduled session (`RunHistory`).

use std::fmt;
use std::time::Duration;

use metrics::{counter, histogram};

/// Record a finished run
pub fn record_run(success: bool, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!("deal_exporter_runs_total", "status" => status).increment(1);
    histogram!("deal_exporter_run_duration_seconds").record(duration.as_secs_f64());
}

/// Record rows written for a partner
pub fn record_rows_published(partner: &str, rows: usize) {
    counter!(
        "deal_exporter_rows_published_total",
        "partner" => partner.to_string()
    )
    .increment(rows as u64);
}

/// Record a partner skipped for lack of matching deals
pub fn record_partner_skipped(partner: &str) {
    counter!(
        "deal_exporter_partners_skipped_total",
        "partner" => partner.to_string()
    )
    .increment(1);
}

/// What happened to one partner during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartnerStatus {
    /// Written to every sink
    Published { updated_cells: usize },
    /// No matching deals, sinks not called
    Skipped,
    /// A sink failed; the run stopped here
    Failed,
}

/// Per-partner line of the run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerOutcome {
    pub keyword: String,
    pub sheet_name: String,
    pub deals: usize,
    pub status: PartnerStatus,
}

/// Counts for one export run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub stage_labels: usize,
    pub category_labels: usize,
    pub deals_fetched: usize,
    pub partners: Vec<PartnerOutcome>,
    pub duration: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a partner outcome and update the facade counters
    pub fn push_partner(&mut self, outcome: PartnerOutcome) {
        match outcome.status {
            PartnerStatus::Published { .. } => record_rows_published(&outcome.keyword, outcome.deals),
            PartnerStatus::Skipped => record_partner_skipped(&outcome.keyword),
            PartnerStatus::Failed => {}
        }
        self.partners.push(outcome);
    }

    pub fn published(&self) -> usize {
        self.partners
            .iter()
            .filter(|p| matches!(p.status, PartnerStatus::Published { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.partners
            .iter()
            .filter(|p| p.status == PartnerStatus::Skipped)
            .count()
    }

    /// Sum of cells reported by the sinks
    pub fn total_cells(&self) -> usize {
        self.partners
            .iter()
            .map(|p| match p.status {
                PartnerStatus::Published { updated_cells } => updated_cells,
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Export Summary ===")?;
        writeln!(
            f,
            "Labels: {} stages, {} categories",
            self.stage_labels, self.category_labels
        )?;
        writeln!(f, "Deals fetched: {}", self.deals_fetched)?;
        writeln!(f, "{:<20} {:<20} {:>7} {:>10}", "Partner", "Sheet", "Deals", "Cells")?;
        for p in &self.partners {
            let cells = match p.status {
                PartnerStatus::Published { updated_cells } => updated_cells.to_string(),
                PartnerStatus::Skipped => "skipped".to_string(),
                PartnerStatus::Failed => "FAILED".to_string(),
            };
            writeln!(
                f,
                "{:<20} {:<20} {:>7} {:>10}",
                p.keyword, p.sheet_name, p.deals, cells
            )?;
        }
        writeln!(
            f,
            "Published {} partner(s), skipped {}, {} cells total in {:.1}s",
            self.published(),
            self.skipped(),
            self.total_cells(),
            self.duration.as_secs_f64()
        )
    }
}

/// Outcomes across scheduled runs
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    pub runs: u64,
    pub failures: u64,
    /// Run durations in seconds
    pub durations: RunningStats,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the aggregate and the facade metrics
    pub fn record(&mut self, success: bool, duration: Duration) {
        record_run(success, duration);
        self.runs += 1;
        if !success {
            self.failures += 1;
        }
        self.durations.push(duration.as_secs_f64());
    }
}

impl fmt::Display for RunHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} run(s), {} failed, duration (s): {}",
            self.runs,
            self.failures,
            StatsSummary::from(&self.durations)
        )
    }
}

/// Stats summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

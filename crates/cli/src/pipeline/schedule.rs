//! Cron-driven repetition of the export.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use cron::Schedule;
use observability::{RunHistory, RunStats};
use tracing::{error, info};

/// Parse a six-field cron expression
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).with_context(|| format!("Invalid cron expression '{expr}'"))
}

/// First trigger strictly after `after`, in local time
pub fn next_trigger(schedule: &Schedule, after: DateTime<Local>) -> Option<DateTime<Local>> {
    schedule.after(&after).next()
}

/// Run `job` now, then at every trigger of `schedule`, until `shutdown` resolves
///
/// Runs never overlap: the next trigger is computed after the previous run
/// returns. A failed run is logged and the loop continues.
pub async fn run_scheduled<F, Fut, S>(schedule: &Schedule, mut job: F, shutdown: S) -> RunHistory
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunStats>>,
    S: Future<Output = ()>,
{
    let mut history = RunHistory::new();
    tokio::pin!(shutdown);

    loop {
        let started = std::time::Instant::now();
        let outcome = tokio::select! {
            outcome = job() => outcome,
            _ = &mut shutdown => {
                info!("shutdown requested during run");
                break;
            }
        };
        match outcome {
            Ok(stats) => {
                history.record(true, stats.duration);
                info!("scheduled run finished\n{stats}");
            }
            Err(e) => {
                history.record(false, started.elapsed());
                error!(error = %format!("{e:#}"), "scheduled run failed, waiting for next trigger");
            }
        }

        let Some(next) = next_trigger(schedule, Local::now()) else {
            info!("schedule has no further triggers");
            break;
        };
        let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
        info!(next = %next.format("%Y-%m-%d %H:%M:%S"), wait_secs = wait.as_secs(), "waiting for next run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                info!("shutdown requested while idle");
                break;
            }
        }
    }

    info!(%history, "scheduler stopped");
    history
}

//! Startup polling for the first solution.

use std::time::Duration;

use chrono::NaiveDateTime;

use gf_core::{Diagnostic, DiagnosticKind};
use gf_fleet::Solution;

use crate::{Intake, IntakeError, IntakeResult};

/// Poll `intake` every `interval` until it yields a structurally valid
/// solution for `interval_start`, giving up after `attempts` tries.
///
/// "Not ready" answers and transient fetch errors both count as an attempt
/// and are retried; errors are also reported as `FetchFailure`
/// diagnostics.
///
/// # Errors
///
/// `IntakeError::NotAvailable` once the attempt budget is spent.
pub async fn poll_first_solution(
    intake:         &Intake,
    interval_start: NaiveDateTime,
    interval:       Duration,
    attempts:       u32,
) -> IntakeResult<Solution> {
    for attempt in 1..=attempts {
        match intake.fetch(interval_start).await {
            Ok(Some(solution)) => {
                tracing::info!(
                    attempt,
                    trucks = solution.assignments.len(),
                    start = %interval_start,
                    "first solution received"
                );
                return Ok(solution);
            }
            Ok(None) => {
                tracing::debug!(attempt, attempts, "solver not ready");
            }
            Err(e) => {
                intake.sink().report(Diagnostic::new(
                    DiagnosticKind::FetchFailure,
                    interval_start.to_string(),
                    format!("attempt {attempt}/{attempts}: {e}"),
                ));
            }
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    tracing::error!(attempts, start = %interval_start, "no solution available, giving up");
    Err(IntakeError::NotAvailable { attempts })
}

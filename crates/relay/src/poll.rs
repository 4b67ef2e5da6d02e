//! Poll loop around the transfer cycle.
//!
//! Runs a cycle, logs how it went, sleeps, and repeats. Cycle-level
//! failures (unreachable source, missing directory, listing errors) are
//! logged and never end the loop; only the cancellation token does.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::CycleError;
use crate::orchestrator::TransferOrchestrator;
use crate::types::CycleReport;

/// Default sleep between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Repeats transfer cycles with a fixed sleep in between.
pub struct PollLoop {
    orchestrator: TransferOrchestrator,
    interval: Duration,
    cancel: CancellationToken,
}

impl PollLoop {
    pub fn new(orchestrator: TransferOrchestrator, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) between cycles or during the
    /// sleep. A cycle in progress always finishes.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single cycle and logs its result.
    pub async fn run_once(&self) -> Result<CycleReport, CycleError> {
        match self.orchestrator.run_cycle().await {
            Ok(report) => {
                if report.is_empty() {
                    debug!("no files to process");
                } else {
                    info!(
                        transferred = report.transferred(),
                        failed = report.failed(),
                        duplicated = report.duplicated(),
                        "cycle complete"
                    );
                }
                if report.duplicated() > 0 {
                    warn!(
                        duplicated = report.duplicated(),
                        "some uploaded files are still on the source"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "cycle failed");
                Err(e)
            }
        }
    }

    /// Runs cycles until cancelled. Returns the number of cycles run.
    pub async fn run(&self) -> u64 {
        let secs = self.interval.as_secs();
        let mut cycles: u64 = 0;

        while !self.cancel.is_cancelled() {
            let _ = self.run_once().await;
            cycles += 1;

            info!(secs, "sleeping for {secs} seconds before next check");
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(cycles, "poll loop stopped");
        cycles
    }
}

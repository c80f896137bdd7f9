// Fixed-cadence driver for the stale order reconciler

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::core::exchange::Exchange;
use crate::core::reconciler::{PassError, StaleOrderReconciler};
use crate::core::shutdown::ShutdownSignal;
use crate::core::types::ReconciliationOutcome;
use crate::error::ReaperError;

/// Running totals across the passes of one loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub passes: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub cancel_failures: usize,
}

impl LoopSummary {
    fn record(&mut self, result: &Result<ReconciliationOutcome, PassError>) {
        self.passes += 1;
        match result {
            Ok(outcome) => {
                self.succeeded += 1;
                self.cancelled += outcome.cancelled_count();
                self.cancel_failures += outcome.failed_count();
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Runs passes back to back with a fixed pause in between.
///
/// A failed pass is logged and followed by the same pause as a successful
/// one. There is no backoff, no retry cap and no circuit breaker.
pub struct ReconciliationLoop<E: Exchange> {
    reconciler: StaleOrderReconciler<E>,
    poll_interval: Duration,
}

impl<E: Exchange> ReconciliationLoop<E> {
    pub fn new(reconciler: StaleOrderReconciler<E>, poll_interval: Duration) -> Self {
        Self {
            reconciler,
            poll_interval,
        }
    }

    pub fn reconciler(&self) -> &StaleOrderReconciler<E> {
        &self.reconciler
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run until `shutdown` fires.
    ///
    /// Shutdown is honoured between passes only: a pass that has started
    /// always finishes, while the pause after it is cut short.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> LoopSummary {
        let mut summary = LoopSummary::default();
        info!(
            pair = self.reconciler.pair(),
            interval_secs = self.poll_interval.as_secs_f64(),
            "🚀 Reconciliation loop started"
        );

        while !shutdown.is_triggered() {
            let result = self.execute_pass().await;
            summary.record(&result);

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!(
            passes = summary.passes,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            cancel_failures = summary.cancel_failures,
            "🛑 Reconciliation loop stopped"
        );
        summary
    }

    /// Run exactly `passes` passes with the usual pause between them
    pub async fn run_passes(&self, passes: usize) -> LoopSummary {
        let mut summary = LoopSummary::default();

        for n in 0..passes {
            if n > 0 {
                sleep(self.poll_interval).await;
            }
            let result = self.execute_pass().await;
            summary.record(&result);
        }

        summary
    }

    /// One isolated pass; panics inside the pass come back as
    /// `PassError::Unclassified` so the loop keeps going.
    pub async fn execute_pass(&self) -> Result<ReconciliationOutcome, PassError> {
        let result = match AssertUnwindSafe(self.reconciler.run_pass()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(PassError::Unclassified(ReaperError::Internal(format!(
                    "pass panicked: {}",
                    msg
                ))))
            }
        };

        if let Err(e) = &result {
            report_pass_failure(e);
        }

        result
    }
}

fn report_pass_failure(err: &PassError) {
    match err {
        PassError::InsufficientData { available, required } => {
            warn!(
                kind = err.kind(),
                available,
                required,
                "⚠️  OHLC data fetch returned too few bars, skipping pass"
            );
        }
        PassError::MarketData(e) => {
            warn!(kind = err.kind(), category = e.category(), error = %e, "⚠️  OHLC data fetch failed, skipping pass");
        }
        PassError::OpenOrders(e) => {
            warn!(kind = err.kind(), category = e.category(), error = %e, "⚠️  Open orders fetch failed, skipping pass");
        }
        PassError::Unclassified(e) => {
            error!(kind = err.kind(), category = e.category(), error = %e, "❌ Exception in reconciliation loop");
        }
    }
}

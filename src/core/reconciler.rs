// One reconciliation pass: bars -> signal -> open orders -> cancellations

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ReconcilerConfig;
use crate::core::classifier::{classify, OrderDecision};
use crate::core::exchange::Exchange;
use crate::core::signal::SignalCalculator;
use crate::core::types::{CancelFailure, ReconciliationOutcome};
use crate::error::ReaperError;

/// Failures that end a pass early. Cancel failures never appear here; they
/// are recorded per order in the outcome.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("insufficient market data: {available} bars, {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("market data fetch failed: {0}")]
    MarketData(#[source] ReaperError),

    #[error("open orders fetch failed: {0}")]
    OpenOrders(#[source] ReaperError),

    #[error("unclassified pass failure: {0}")]
    Unclassified(#[source] ReaperError),
}

impl PassError {
    /// Taxonomy label used in log records
    pub fn kind(&self) -> &'static str {
        match self {
            PassError::InsufficientData { .. } => "data_insufficient",
            PassError::MarketData(_) | PassError::OpenOrders(_) => "fetch_failure",
            PassError::Unclassified(_) => "unclassified",
        }
    }

    /// Whether the pass was abandoned before any order was touched
    pub fn is_benign(&self) -> bool {
        !matches!(self, PassError::Unclassified(_))
    }
}

pub struct StaleOrderReconciler<E: Exchange> {
    exchange: Arc<E>,
    calculator: SignalCalculator,
    pair: String,
    interval_minutes: u32,
    min_bars: usize,
    dry_run: bool,
}

impl<E: Exchange> StaleOrderReconciler<E> {
    pub fn new(exchange: Arc<E>, settings: &ReconcilerConfig) -> Self {
        Self {
            exchange,
            calculator: SignalCalculator::new(settings.fast_window, settings.slow_window),
            pair: settings.pair.clone(),
            interval_minutes: settings.interval_minutes,
            min_bars: settings.min_bars,
            dry_run: settings.dry_run,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn calculator(&self) -> &SignalCalculator {
        &self.calculator
    }

    /// Bars a fetch must return before any order is evaluated
    pub fn required_bars(&self) -> usize {
        self.min_bars.max(self.calculator.required_bars())
    }

    /// Run one full pass.
    ///
    /// Market data is fetched and checked before the order book is read, so
    /// a missing or short series leaves every order untouched. Once orders
    /// are fetched, every stale one gets a cancellation attempt regardless of
    /// earlier failures.
    pub async fn run_pass(&self) -> Result<ReconciliationOutcome, PassError> {
        let pass_id = Uuid::new_v4();
        info!(
            pass_id = %pass_id,
            pair = %self.pair,
            exchange = self.exchange.name(),
            dry_run = self.dry_run,
            "🔄 Reconciliation pass started"
        );

        let series = self
            .exchange
            .fetch_ohlc(&self.pair, self.interval_minutes)
            .await
            .map_err(PassError::MarketData)?;

        let required = self.required_bars();
        if series.len() < required {
            return Err(PassError::InsufficientData {
                available: series.len(),
                required,
            });
        }

        let reading = self.calculator.compute(&series).ok_or_else(|| {
            PassError::Unclassified(ReaperError::Internal(format!(
                "no usable signal from {} bars (non-finite close in window)",
                series.len()
            )))
        })?;

        info!(
            pass_id = %pass_id,
            signal = %reading.signal,
            fast = reading.fast,
            slow = reading.slow,
            bars = series.len(),
            "📊 Current signal: {}",
            reading.signal
        );

        let orders = self
            .exchange
            .open_orders()
            .await
            .map_err(PassError::OpenOrders)?;

        debug!(pass_id = %pass_id, open_orders = orders.len(), "Fetched open orders");

        let exchange = self.exchange.as_ref();
        let signal = reading.signal;
        let dry_run = self.dry_run;

        let outcome = stream::iter(orders)
            .fold(
                ReconciliationOutcome::new(pass_id, signal),
                move |mut outcome, order| async move {
                    outcome.evaluated += 1;

                    match classify(&order, signal) {
                        OrderDecision::Keep => {
                            debug!(order_id = %order.id, side = %order.side, "Order matches signal, keeping");
                            outcome.kept.push(order.id);
                        }
                        OrderDecision::Cancel if dry_run => {
                            info!(order_id = %order.id, side = %order.side, "🧪 Would cancel stale order (dry run)");
                            outcome.dry_run_skipped.push(order.id);
                        }
                        OrderDecision::Cancel => {
                            let result = exchange.cancel_order(&order.id).await;
                            match result {
                                Ok(()) => {
                                    info!(order_id = %order.id, side = %order.side, "🗑️  Cancelled stale order: {}", order.id);
                                    outcome.cancelled.push(order.id);
                                }
                                Err(e) => {
                                    error!(
                                        order_id = %order.id,
                                        side = %order.side,
                                        error = %e,
                                        "❌ Failed to cancel order {}: {}",
                                        order.id,
                                        e
                                    );
                                    outcome.failed.push(CancelFailure {
                                        order_id: order.id,
                                        reason: e.to_string(),
                                    });
                                }
                            }
                        }
                    }

                    outcome
                },
            )
            .await;

        if outcome.failed.is_empty() {
            info!(
                pass_id = %pass_id,
                evaluated = outcome.evaluated,
                kept = outcome.kept_count(),
                cancelled = outcome.cancelled_count(),
                "✅ Pass complete"
            );
        } else {
            warn!(
                pass_id = %pass_id,
                evaluated = outcome.evaluated,
                kept = outcome.kept_count(),
                cancelled = outcome.cancelled_count(),
                failed = outcome.failed_count(),
                "⚠️  Pass complete with cancel failures"
            );
        }

        Ok(outcome)
    }
}

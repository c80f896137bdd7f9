// Core reconciliation logic modules

pub mod types;
pub mod signal;
pub mod classifier;
pub mod exchange;
pub mod reconciler;
pub mod reconciliation_loop;
pub mod shutdown;

// Re-export commonly used types
pub use types::{Bar, BarSeries, CancelFailure, OpenOrder, OrderSide, ReconciliationOutcome, Signal};
pub use signal::{sma, SignalCalculator, SignalReading};
pub use classifier::{classify, is_still_valid, OrderDecision};
pub use exchange::Exchange;
pub use reconciler::{PassError, StaleOrderReconciler};
pub use reconciliation_loop::{LoopSummary, ReconciliationLoop};
pub use shutdown::{shutdown_channel, ShutdownHandle, ShutdownSignal};

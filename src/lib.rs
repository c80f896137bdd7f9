// Stale Order Reaper Library
//
// Keeps resting Kraken orders consistent with a 5/15 SMA trend signal by
// cancelling every order whose side the current signal no longer supports.

pub mod core;
pub mod clients;
pub mod config;
pub mod error;    // Unified error handling
pub mod logging;

// Re-export core types
pub use core::{
    Bar, BarSeries, CancelFailure, OpenOrder, OrderSide, ReconciliationOutcome, Signal,
    SignalCalculator, SignalReading, OrderDecision, classify, is_still_valid,
    Exchange, PassError, StaleOrderReconciler, LoopSummary, ReconciliationLoop,
    shutdown_channel, ShutdownHandle, ShutdownSignal,
};

// Re-export error types
pub use error::{ReaperError, ReaperResult};

// Re-export client types
pub use clients::{KrakenCredentials, KrakenRestClient};

// Re-export configuration
pub use config::{Config, ApiConfig, ReconcilerConfig, LoggingConfig, ConfigError};

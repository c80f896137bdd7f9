// Domain types shared by the reconciliation core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One OHLCV sample as returned by the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    // Auxiliary fields, unused by the signal
    pub vwap: f64,
    pub volume: f64,
    pub count: u64,
}

/// Chronologically ordered bars for one pair at one interval.
///
/// Re-fetched on every pass; nothing is carried across passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub pair: String,
    pub interval_minutes: u32,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, sorting bars by timestamp
    pub fn new(pair: impl Into<String>, interval_minutes: u32, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        Self {
            pair: pair.into(),
            interval_minutes,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}

/// Directional signal derived from the latest bar series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "long"),
            Signal::Short => write!(f, "short"),
            Signal::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(format!("unknown order side '{}'", other)),
        }
    }
}

/// A resting order owned by the exchange.
///
/// Only `id` and `side` drive decisions; the rest is broker detail carried
/// along for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: String,
    pub side: OrderSide,
    #[serde(default)]
    pub pair: String,
    #[serde(default)]
    pub order_type: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub description: String,
}

impl OpenOrder {
    pub fn new(id: impl Into<String>, side: OrderSide) -> Self {
        Self {
            id: id.into(),
            side,
            pair: String::new(),
            order_type: String::new(),
            price: None,
            volume: None,
            description: String::new(),
        }
    }
}

/// A cancellation request the exchange refused or that failed in transit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelFailure {
    pub order_id: String,
    pub reason: String,
}

/// What one reconciliation pass saw and did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationOutcome {
    pub pass_id: Uuid,
    pub signal: Signal,
    pub evaluated: usize,
    pub kept: Vec<String>,
    pub cancelled: Vec<String>,
    pub failed: Vec<CancelFailure>,
    /// Stale orders left alone because the pass ran in dry-run mode
    pub dry_run_skipped: Vec<String>,
}

impl ReconciliationOutcome {
    pub fn new(pass_id: Uuid, signal: Signal) -> Self {
        Self {
            pass_id,
            signal,
            evaluated: 0,
            kept: Vec::new(),
            cancelled: Vec::new(),
            failed: Vec::new(),
            dry_run_skipped: Vec::new(),
        }
    }

    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Orders classified stale this pass, whether or not they were cancelled
    pub fn stale_count(&self) -> usize {
        self.cancelled.len() + self.failed.len() + self.dry_run_skipped.len()
    }
}

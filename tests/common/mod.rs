// Common test utilities and helpers

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use stale_order_reaper::{
    Bar, BarSeries, Config, Exchange, OpenOrder, OrderSide, ReaperError, ReaperResult,
    ReconcilerConfig, ShutdownHandle,
};

pub const TEST_PAIR: &str = "XXDGZUSD";

/// Reconciler settings with the reference 5/15 policy
pub fn create_test_settings() -> ReconcilerConfig {
    ReconcilerConfig {
        pair: TEST_PAIR.to_string(),
        interval_minutes: 1,
        poll_interval_seconds: 15,
        fast_window: 5,
        slow_window: 15,
        min_bars: 15,
        dry_run: false,
    }
}

/// Full configuration with non-placeholder credentials
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.api.api_key = "test-key".to_string();
    config.api.api_secret = "c2VjcmV0LWtleQ==".to_string();
    config.reconciler = create_test_settings();
    config
}

/// One-minute bars with the given closes, oldest first
pub fn series_from_closes(closes: &[f64]) -> BarSeries {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + Duration::minutes(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            vwap: close,
            volume: 100.0,
            count: 5,
        })
        .collect();
    BarSeries::new(TEST_PAIR, 1, bars)
}

/// 20 closes whose latest SMA(5) is 1.50 and SMA(15) is 1.40
pub fn long_signal_closes() -> Vec<f64> {
    let mut closes = vec![1.0; 5];
    closes.extend(vec![1.35; 10]);
    closes.extend(vec![1.50; 5]);
    closes
}

/// 20 closes whose latest SMA(5) is below SMA(15)
pub fn short_signal_closes() -> Vec<f64> {
    let mut closes = vec![1.0; 5];
    closes.extend(vec![1.45; 10]);
    closes.extend(vec![1.30; 5]);
    closes
}

pub fn flat_closes() -> Vec<f64> {
    vec![0.25; 20]
}

pub fn order(id: &str, side: OrderSide) -> OpenOrder {
    OpenOrder::new(id, side)
}

/// Scriptable in-memory exchange
#[derive(Default)]
pub struct MockExchange {
    series: Mutex<Option<BarSeries>>,
    orders: Mutex<Option<Vec<OpenOrder>>>,
    failing_cancels: Mutex<HashSet<String>>,
    /// 1-based OHLC call numbers that fail
    failing_fetches: Mutex<HashSet<usize>>,
    /// 1-based OHLC call number that panics
    panic_on_fetch: Mutex<Option<usize>>,
    /// Initiate shutdown once this many OHLC calls were made
    shutdown_after: Mutex<Option<(usize, ShutdownHandle)>>,
    pub ohlc_calls: AtomicUsize,
    pub open_order_calls: AtomicUsize,
    pub cancel_calls: Mutex<Vec<String>>,
}

impl MockExchange {
    pub fn new(series: BarSeries, orders: Vec<OpenOrder>) -> Self {
        let mock = Self::default();
        *mock.series.lock().unwrap() = Some(series);
        *mock.orders.lock().unwrap() = Some(orders);
        mock
    }

    pub fn with_market_data_failure(self) -> Self {
        *self.series.lock().unwrap() = None;
        self
    }

    pub fn with_open_orders_failure(self) -> Self {
        *self.orders.lock().unwrap() = None;
        self
    }

    pub fn failing_cancel(self, order_id: &str) -> Self {
        self.failing_cancels.lock().unwrap().insert(order_id.to_string());
        self
    }

    pub fn failing_fetch_on_call(self, call: usize) -> Self {
        self.failing_fetches.lock().unwrap().insert(call);
        self
    }

    pub fn panicking_fetch_on_call(self, call: usize) -> Self {
        *self.panic_on_fetch.lock().unwrap() = Some(call);
        self
    }

    pub fn shutdown_after_calls(self, calls: usize, handle: ShutdownHandle) -> Self {
        *self.shutdown_after.lock().unwrap() = Some((calls, handle));
        self
    }

    pub fn cancelled_ids(&self) -> Vec<String> {
        self.cancel_calls.lock().unwrap().clone()
    }

    pub fn ohlc_call_count(&self) -> usize {
        self.ohlc_calls.load(Ordering::SeqCst)
    }

    pub fn open_order_call_count(&self) -> usize {
        self.open_order_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn fetch_ohlc(&self, _pair: &str, _interval_minutes: u32) -> ReaperResult<BarSeries> {
        let call = self.ohlc_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((after, handle)) = self.shutdown_after.lock().unwrap().as_ref() {
            if call >= *after {
                handle.initiate_shutdown();
            }
        }

        if *self.panic_on_fetch.lock().unwrap() == Some(call) {
            panic!("mock exchange exploded on call {}", call);
        }

        if self.failing_fetches.lock().unwrap().contains(&call) {
            return Err(ReaperError::ApiTimeout(format!("OHLC call {} timed out", call)));
        }

        self.series
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ReaperError::ApiConnection("market data unavailable".to_string()))
    }

    async fn open_orders(&self) -> ReaperResult<Vec<OpenOrder>> {
        self.open_order_calls.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ReaperError::ApiAuthentication("EAPI:Invalid key".to_string()))
    }

    async fn cancel_order(&self, order_id: &str) -> ReaperResult<()> {
        self.cancel_calls.lock().unwrap().push(order_id.to_string());
        if self.failing_cancels.lock().unwrap().contains(order_id) {
            return Err(ReaperError::OrderFailed("EOrder:Unknown order".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

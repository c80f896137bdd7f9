//! Exchange collaborator seen by the reconciliation core.

use crate::core::types::{BarSeries, OpenOrder};
use crate::error::ReaperResult;
use async_trait::async_trait;

/// Market data, open-order snapshots and cancellation.
///
/// Implementations own transport concerns (authentication, timeouts,
/// rate limiting); the core treats every `Err` as an ordinary failure of
/// that one call.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Recent bars for `pair` at `interval_minutes` granularity, oldest first.
    async fn fetch_ohlc(&self, pair: &str, interval_minutes: u32) -> ReaperResult<BarSeries>;

    /// The account's resting orders, in whatever order the exchange returns them.
    async fn open_orders(&self) -> ReaperResult<Vec<OpenOrder>>;

    /// Request cancellation of one order.
    ///
    /// Cancelling an order that is already gone is reported as `Err`, not a panic.
    async fn cancel_order(&self, order_id: &str) -> ReaperResult<()>;

    fn name(&self) -> &str;
}

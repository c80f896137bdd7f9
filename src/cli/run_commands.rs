// Reconciliation command implementations
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use stale_order_reaper::{
    shutdown_channel, Config, Exchange, KrakenRestClient, ReaperError, ReaperResult,
    ReconciliationLoop, SignalCalculator, StaleOrderReconciler,
};

fn build_loop(config: &Config, dry_run: bool) -> ReaperResult<ReconciliationLoop<KrakenRestClient>> {
    let client = Arc::new(KrakenRestClient::from_config(&config.api)?);
    let reconciler = StaleOrderReconciler::new(client, &config.reconciler)
        .with_dry_run(dry_run || config.reconciler.dry_run);

    Ok(ReconciliationLoop::new(
        reconciler,
        Duration::from_secs(config.reconciler.poll_interval_seconds),
    ))
}

fn announce(config: &Config, dry_run: bool) {
    let r = &config.reconciler;
    if dry_run {
        info!("🧪 DRY RUN mode (stale orders are logged, not cancelled)");
    } else {
        warn!("⚠️  Stale orders on {} will be cancelled", r.pair);
    }
    info!(
        "📊 {} @ {}m bars, SMA {}/{}, pass every {}s",
        r.pair, r.interval_minutes, r.fast_window, r.slow_window, r.poll_interval_seconds
    );
}

/// Run the reconciliation loop until Ctrl+C
pub async fn run_loop(config: &Config, dry_run: bool) -> ReaperResult<()> {
    let dry_run = dry_run || config.reconciler.dry_run;
    announce(config, dry_run);

    let reconciliation_loop = build_loop(config, dry_run)?;
    let (handle, signal) = shutdown_channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Received Ctrl+C, finishing current pass");
            handle.initiate_shutdown();
        }
    });

    info!("🎯 Bot started - Press Ctrl+C to stop");
    let summary = reconciliation_loop.run(signal).await;

    info!("📊 Session Summary:");
    info!("   🔄 Passes: {} ({} ok, {} failed)", summary.passes, summary.succeeded, summary.failed);
    info!("   🗑️  Orders cancelled: {}", summary.cancelled);
    info!("   ❌ Cancel failures: {}", summary.cancel_failures);
    Ok(())
}

/// Run a single pass and report what it did
pub async fn run_once(config: &Config, dry_run: bool) -> ReaperResult<()> {
    let dry_run = dry_run || config.reconciler.dry_run;
    announce(config, dry_run);

    let reconciliation_loop = build_loop(config, dry_run)?;
    let outcome = match reconciliation_loop.execute_pass().await {
        Ok(outcome) => outcome,
        // Already logged by the loop; nothing was touched
        Err(e) if e.is_benign() => return Ok(()),
        Err(e) => return Err(ReaperError::Internal(e.to_string())),
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📈 Signal: {}", outcome.signal);
    info!("🔍 Evaluated: {}", outcome.evaluated);
    info!("✅ Kept: {}", outcome.kept_count());
    info!("🗑️  Cancelled: {}", outcome.cancelled_count());
    if !outcome.dry_run_skipped.is_empty() {
        info!("🧪 Would cancel: {:?}", outcome.dry_run_skipped);
    }
    for failure in &outcome.failed {
        warn!("❌ {} - {}", failure.order_id, failure.reason);
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    Ok(())
}

/// Fetch bars and print the current signal; never touches orders
pub async fn show_signal(config: &Config) -> ReaperResult<()> {
    let r = &config.reconciler;
    let client = KrakenRestClient::from_config(&config.api)?;
    let calculator = SignalCalculator::new(r.fast_window, r.slow_window);

    let series = client.fetch_ohlc(&r.pair, r.interval_minutes).await?;
    let required = r.min_bars.max(calculator.required_bars());

    if series.len() < required {
        warn!("⚠️  Only {} bars for {}, need {}", series.len(), r.pair, required);
        return Ok(());
    }

    let reading = calculator
        .compute(&series)
        .ok_or_else(|| ReaperError::Internal("signal unavailable".to_string()))?;

    if let Some(last) = series.last() {
        info!("💰 {} close: {} at {}", r.pair, last.close, last.timestamp.format("%Y-%m-%d %H:%M UTC"));
    }
    info!("📉 SMA{}: {:.6}", r.fast_window, reading.fast);
    info!("📉 SMA{}: {:.6}", r.slow_window, reading.slow);
    info!("📈 Signal: {}", reading.signal);

    Ok(())
}

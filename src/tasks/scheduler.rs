use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::services::{ai_feedback, gamification};

/// Streaks evaluate calendar days and the increment path is not safe to
/// re-run within one, so the sweep keeps a daily cadence.
const STREAK_SWEEP_INTERVAL_SECONDS: u64 = 86_400;
const FEEDBACK_BACKFILL_INTERVAL_SECONDS: u64 = 600;
/// Submissions picked up per backfill sweep.
const FEEDBACK_BACKFILL_LIMIT: i64 = 10;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(2);
    handles.push(tokio::spawn(streak_sweep_loop(state.clone(), shutdown_rx.clone())));
    handles.push(tokio::spawn(feedback_backfill_loop(state.clone(), shutdown_rx.clone())));

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn streak_sweep_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(STREAK_SWEEP_INTERVAL_SECONDS));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                match gamification::update_streaks(state.db(), state.points(), primitive_now_utc()).await {
                    Ok(sweep) => {
                        if sweep.incremented > 0 || sweep.reset > 0 || sweep.failed > 0 {
                            tracing::info!(
                                incremented = sweep.incremented,
                                reset = sweep.reset,
                                unchanged = sweep.unchanged,
                                failed = sweep.failed,
                                "Streak sweep finished"
                            );
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "Streak sweep failed"),
                }
            }
        }
    }
}

async fn feedback_backfill_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(FEEDBACK_BACKFILL_INTERVAL_SECONDS));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                let outcome = ai_feedback::backfill_missing(&state, FEEDBACK_BACKFILL_LIMIT).await;
                if outcome.processed > 0 || outcome.failed > 0 {
                    tracing::info!(
                        processed = outcome.processed,
                        failed = outcome.failed,
                        "Feedback backfill sweep finished"
                    );
                }
            }
        }
    }
}

//! Time-Weighted Average Price execution
//!
//! Splits a total quantity into equal market-order slices submitted once per
//! interval. Each run owns a tokio task that is the only writer of its state.

use super::{new_strategy_id, StopReason, Strategy, StrategyError, StrategyRegistry};
use crate::execution::{OrderRequest, OrderResult, OrderSubmitter, Side};
use crate::telemetry;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Parameters for starting a TWAP
#[derive(Debug, Clone)]
pub struct TwapParams {
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,
    pub duration: Duration,
    pub interval: Duration,
}

impl TwapParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.total_quantity <= Decimal::ZERO {
            return Err(StrategyError::Validation(format!(
                "total quantity must be positive, got {}",
                self.total_quantity
            )));
        }
        if self.duration.is_zero() {
            return Err(StrategyError::Validation(
                "duration must be positive".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(StrategyError::Validation(
                "interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Number of whole intervals that fit in the duration
pub fn slice_count(duration: Duration, interval: Duration) -> u64 {
    if interval.is_zero() {
        return 0;
    }
    u64::try_from(duration.as_nanos() / interval.as_nanos()).unwrap_or(u64::MAX)
}

/// Fields written by the TWAP task
#[derive(Debug, Clone, PartialEq)]
struct TwapState {
    remaining_quantity: Decimal,
    orders: Vec<OrderResult>,
    active: bool,
    finished_at: Option<DateTime<Utc>>,
    stop_reason: Option<StopReason>,
}

/// A registered TWAP run
pub struct TwapStrategy {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,
    pub duration: Duration,
    pub interval: Duration,
    pub slice_count: u64,
    pub quantity_per_slice: Decimal,
    pub started_at: DateTime<Utc>,
    state: RwLock<TwapState>,
    cancel_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

/// Point-in-time view of a TWAP run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwapSnapshot {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub duration: Duration,
    pub interval: Duration,
    pub slice_count: u64,
    pub quantity_per_slice: Decimal,
    pub orders: Vec<OrderResult>,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<StopReason>,
}

impl TwapSnapshot {
    /// Quantity sent in slices so far, including failed slices
    pub fn executed_quantity(&self) -> Decimal {
        self.orders.iter().map(|o| o.quantity).sum()
    }

    /// Quantity in slices the exchange accepted
    pub fn accepted_quantity(&self) -> Decimal {
        self.orders
            .iter()
            .filter(|o| !o.is_failed())
            .map(|o| o.quantity)
            .sum()
    }

    pub fn failed_slices(&self) -> usize {
        self.orders.iter().filter(|o| o.is_failed()).count()
    }
}

impl TwapStrategy {
    pub async fn snapshot(&self) -> TwapSnapshot {
        let state = self.state.read().await.clone();
        TwapSnapshot {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            side: self.side,
            total_quantity: self.total_quantity,
            remaining_quantity: state.remaining_quantity,
            duration: self.duration,
            interval: self.interval,
            slice_count: self.slice_count,
            quantity_per_slice: self.quantity_per_slice,
            orders: state.orders,
            active: state.active,
            started_at: self.started_at,
            finished_at: state.finished_at,
            stop_reason: state.stop_reason,
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.active
    }

    /// Signal the task to stop at its next slice boundary.
    ///
    /// Returns `false` if the run had already finished or was already asked
    /// to stop. A `true` return always ends the run as Cancelled.
    pub async fn request_cancel(&self) -> bool {
        // Held across the send so the task cannot write its final state in between
        let state = self.state.read().await;
        if !state.active {
            return false;
        }
        let already_requested = self.cancel_tx.send_replace(true);
        drop(state);

        if !already_requested {
            tracing::info!(strategy_id = %self.id, "TWAP cancellation requested");
        }
        !already_requested
    }

    /// Write the final state. A pending cancel wins over a normal finish.
    async fn finish(&self, mut stop_reason: StopReason) {
        let mut state = self.state.write().await;
        if *self.cancel_tx.borrow() && stop_reason != StopReason::Aborted {
            stop_reason = StopReason::Cancelled;
        }
        state.active = false;
        state.finished_at = Some(Utc::now());
        state.stop_reason = Some(stop_reason);

        tracing::info!(
            strategy_id = %self.id,
            reason = ?stop_reason,
            remaining = %state.remaining_quantity,
            orders = state.orders.len(),
            "TWAP finished"
        );
    }

    /// Resolve once the task has written its final state
    pub async fn wait_until_done(&self) {
        let mut done_rx = self.done_rx.clone();
        // An Err means the task is gone, which is as done as it gets
        let _ = done_rx.wait_for(|done| *done).await;
    }
}

/// Starts TWAP runs and registers them
#[derive(Clone)]
pub struct TwapEngine {
    submitter: OrderSubmitter,
    registry: Arc<StrategyRegistry>,
}

impl TwapEngine {
    pub fn new(submitter: OrderSubmitter, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            submitter,
            registry,
        }
    }

    /// Validate, register and launch a TWAP run.
    ///
    /// Must be called from inside a tokio runtime. The returned id is already
    /// visible in the registry.
    pub fn start(&self, params: TwapParams) -> Result<String, StrategyError> {
        params.validate()?;

        let slices = slice_count(params.duration, params.interval);
        let quantity_per_slice = if slices == 0 {
            Decimal::ZERO
        } else {
            params.total_quantity / Decimal::from(slices)
        };

        let finished_now = slices == 0;
        let now = Utc::now();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(finished_now);

        let strategy = Arc::new(TwapStrategy {
            id: new_strategy_id("twap", &params.symbol),
            symbol: params.symbol,
            side: params.side,
            total_quantity: params.total_quantity,
            duration: params.duration,
            interval: params.interval,
            slice_count: slices,
            quantity_per_slice,
            started_at: now,
            state: RwLock::new(TwapState {
                remaining_quantity: params.total_quantity,
                orders: vec![],
                active: !finished_now,
                finished_at: finished_now.then_some(now),
                stop_reason: finished_now.then_some(StopReason::Completed),
            }),
            cancel_tx,
            done_rx,
        });

        let id = strategy.id.clone();
        self.registry.register(Strategy::Twap(strategy.clone()));

        if finished_now {
            tracing::warn!(
                strategy_id = %id,
                duration = ?strategy.duration,
                interval = ?strategy.interval,
                "TWAP interval longer than duration, nothing to execute"
            );
            return Ok(id);
        }

        tracing::info!(
            strategy_id = %id,
            symbol = %strategy.symbol,
            side = %strategy.side,
            total_quantity = %strategy.total_quantity,
            slices,
            quantity_per_slice = %quantity_per_slice,
            "Started TWAP"
        );

        let submitter = self.submitter.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            registry.publish_active_count().await;

            let run = tokio::spawn({
                let strategy = strategy.clone();
                async move { run_slices(&strategy, &submitter, cancel_rx).await }
            });
            let stop_reason = match run.await {
                Ok(reason) => reason,
                Err(e) => {
                    tracing::error!(strategy_id = %strategy.id, error = %e, "TWAP task aborted");
                    StopReason::Aborted
                }
            };

            strategy.finish(stop_reason).await;
            done_tx.send_replace(true);
            registry.publish_active_count().await;
        });

        Ok(id)
    }
}

/// Slice loop; the sole writer of `strategy.state` while it runs.
///
/// Returns why it stopped; the caller writes the final state.
async fn run_slices(
    strategy: &TwapStrategy,
    submitter: &OrderSubmitter,
    mut cancel_rx: watch::Receiver<bool>,
) -> StopReason {
    let mut stop_reason = StopReason::Completed;

    for slice in 0..strategy.slice_count {
        let cancelled = *cancel_rx.borrow();
        if cancelled {
            stop_reason = StopReason::Cancelled;
            break;
        }

        let remaining = strategy.state.read().await.remaining_quantity;
        if remaining <= Decimal::ZERO {
            stop_reason = StopReason::Depleted;
            break;
        }

        let quantity = strategy.quantity_per_slice.min(remaining);
        let result = submitter
            .submit(OrderRequest::market(&strategy.symbol, strategy.side, quantity))
            .await;
        let failed = result.is_failed();

        let remaining = {
            let mut state = strategy.state.write().await;
            state.orders.push(result);
            state.remaining_quantity -= quantity;
            state.remaining_quantity
        };
        telemetry::record_twap_slice(failed);

        tracing::info!(
            strategy_id = %strategy.id,
            slice = slice + 1,
            slices = strategy.slice_count,
            executed = %quantity,
            remaining = %remaining,
            failed,
            "TWAP slice executed"
        );

        if slice + 1 < strategy.slice_count {
            tokio::select! {
                _ = tokio::time::sleep(strategy.interval) => {}
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {}
            }
        }
    }

    stop_reason
}

//! Grid placement
//!
//! Spreads resting limit orders over evenly spaced levels of a price band.
//! Levels below the market price at creation are bids, the rest are asks.
//! The grid is placed once; it never re-quotes or replaces filled levels.

use super::{new_strategy_id, StopReason, Strategy, StrategyError, StrategyRegistry};
use crate::execution::{OrderRequest, OrderResult, OrderSubmitter, Side};
use crate::telemetry::{self, LatencyMetric};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Parameters for starting a grid
#[derive(Debug, Clone)]
pub struct GridParams {
    pub symbol: String,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub levels: u32,
    pub quantity_per_level: Decimal,
}

impl GridParams {
    pub fn validate(&self, max_levels: u32) -> Result<(), StrategyError> {
        if self.levels < 2 {
            return Err(StrategyError::Validation(format!(
                "grid needs at least 2 levels, got {}",
                self.levels
            )));
        }
        if self.levels > max_levels {
            return Err(StrategyError::Validation(format!(
                "grid has {} levels, limit is {}",
                self.levels, max_levels
            )));
        }
        if self.lower_price <= Decimal::ZERO {
            return Err(StrategyError::Validation(format!(
                "lower price must be positive, got {}",
                self.lower_price
            )));
        }
        if self.lower_price >= self.upper_price {
            return Err(StrategyError::Validation(format!(
                "lower price {} must be below upper price {}",
                self.lower_price, self.upper_price
            )));
        }
        if self.quantity_per_level <= Decimal::ZERO {
            return Err(StrategyError::Validation(format!(
                "quantity per level must be positive, got {}",
                self.quantity_per_level
            )));
        }
        Ok(())
    }
}

/// Evenly spaced prices from `lower` to `upper` inclusive.
///
/// The end points are exact; interior levels are clamped into the band so
/// rounding in the step can never push one outside it.
pub fn grid_levels(lower: Decimal, upper: Decimal, levels: u32) -> Vec<Decimal> {
    if levels < 2 {
        return vec![];
    }
    let step = (upper - lower) / Decimal::from(levels - 1);
    (0..levels)
        .map(|i| {
            if i == levels - 1 {
                upper
            } else {
                (lower + step * Decimal::from(i)).min(upper)
            }
        })
        .collect()
}

/// Split levels into (buys, sells) around the reference price
pub fn classify_levels(levels: &[Decimal], reference: Decimal) -> (Vec<Decimal>, Vec<Decimal>) {
    levels.iter().partition(|&&price| price < reference)
}

#[derive(Debug, Clone, PartialEq)]
struct GridState {
    orders: Vec<OrderResult>,
    active: bool,
    finished_at: Option<DateTime<Utc>>,
    stop_reason: Option<StopReason>,
}

/// A registered grid
pub struct GridStrategy {
    pub id: String,
    pub symbol: String,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub levels: u32,
    pub quantity_per_level: Decimal,
    /// Market price observed when the grid was created
    pub reference_price: Decimal,
    pub buy_levels: Vec<Decimal>,
    pub sell_levels: Vec<Decimal>,
    pub started_at: DateTime<Utc>,
    submitter: OrderSubmitter,
    state: RwLock<GridState>,
}

/// Point-in-time view of a grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub id: String,
    pub symbol: String,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub levels: u32,
    pub quantity_per_level: Decimal,
    pub reference_price: Decimal,
    pub buy_levels: Vec<Decimal>,
    pub sell_levels: Vec<Decimal>,
    pub orders: Vec<OrderResult>,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<StopReason>,
}

impl GridSnapshot {
    /// Orders the exchange accepted
    pub fn resting_orders(&self) -> impl Iterator<Item = &OrderResult> {
        self.orders.iter().filter(|o| !o.is_failed())
    }

    pub fn failed_levels(&self) -> usize {
        self.orders.iter().filter(|o| o.is_failed()).count()
    }
}

impl GridStrategy {
    pub async fn snapshot(&self) -> GridSnapshot {
        let state = self.state.read().await.clone();
        GridSnapshot {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            lower_price: self.lower_price,
            upper_price: self.upper_price,
            levels: self.levels,
            quantity_per_level: self.quantity_per_level,
            reference_price: self.reference_price,
            buy_levels: self.buy_levels.clone(),
            sell_levels: self.sell_levels.clone(),
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

    /// Mark the grid cancelled and pull its resting orders, best effort.
    ///
    /// Returns `false` if the grid was already inactive.
    pub async fn cancel(&self) -> bool {
        let resting: Vec<String> = {
            let mut state = self.state.write().await;
            if !state.active {
                return false;
            }
            state.active = false;
            state.finished_at = Some(Utc::now());
            state.stop_reason = Some(StopReason::Cancelled);
            state
                .orders
                .iter()
                .filter(|o| !o.is_failed())
                .map(|o| o.order_id().to_string())
                .collect()
        };

        let mut cancelled = 0;
        for order_id in &resting {
            if self.cancel_resting(order_id).await {
                cancelled += 1;
            }
        }

        tracing::info!(
            strategy_id = %self.id,
            cancelled,
            resting = resting.len(),
            "Grid cancelled"
        );
        true
    }

    async fn cancel_resting(&self, order_id: &str) -> bool {
        match self
            .submitter
            .exchange()
            .cancel_order(&self.symbol, order_id)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(strategy_id = %self.id, %order_id, "Grid order no longer open");
                false
            }
            Err(e) => {
                tracing::warn!(
                    strategy_id = %self.id,
                    %order_id,
                    error = %e,
                    "Failed to cancel grid order"
                );
                false
            }
        }
    }
}

/// Places grids and registers them
#[derive(Clone)]
pub struct GridEngine {
    submitter: OrderSubmitter,
    registry: Arc<StrategyRegistry>,
    max_levels: u32,
}

impl GridEngine {
    pub fn new(submitter: OrderSubmitter, registry: Arc<StrategyRegistry>, max_levels: u32) -> Self {
        Self {
            submitter,
            registry,
            max_levels,
        }
    }

    /// Validate, read the market price once, place every level, then register.
    ///
    /// Buys go out first, then sells, each in ascending price order. A failed
    /// level is recorded and placement moves on to the next one.
    pub async fn start(&self, params: GridParams) -> Result<String, StrategyError> {
        params.validate(self.max_levels)?;

        let levels = grid_levels(params.lower_price, params.upper_price, params.levels);

        let started = Instant::now();
        let reference_price = self
            .submitter
            .exchange()
            .get_current_price(&params.symbol)
            .await
            .map_err(|source| StrategyError::PriceUnavailable {
                symbol: params.symbol.clone(),
                source,
            })?;
        telemetry::record_latency(LatencyMetric::PriceRead, started.elapsed());

        let (buy_levels, sell_levels) = classify_levels(&levels, reference_price);

        let strategy = Arc::new(GridStrategy {
            id: new_strategy_id("grid", &params.symbol),
            symbol: params.symbol,
            lower_price: params.lower_price,
            upper_price: params.upper_price,
            levels: params.levels,
            quantity_per_level: params.quantity_per_level,
            reference_price,
            buy_levels,
            sell_levels,
            started_at: Utc::now(),
            submitter: self.submitter.clone(),
            state: RwLock::new(GridState {
                orders: Vec::with_capacity(levels.len()),
                active: true,
                finished_at: None,
                stop_reason: None,
            }),
        });

        tracing::info!(
            strategy_id = %strategy.id,
            symbol = %strategy.symbol,
            reference_price = %reference_price,
            buys = strategy.buy_levels.len(),
            sells = strategy.sell_levels.len(),
            "Starting grid"
        );

        self.place_levels(&strategy).await;

        self.registry.register(Strategy::Grid(strategy.clone()));
        self.registry.publish_active_count().await;

        Ok(strategy.id.clone())
    }

    /// Runs before registration, so nothing else can touch the state yet
    async fn place_levels(&self, strategy: &GridStrategy) {
        let placements = strategy
            .buy_levels
            .iter()
            .map(|price| (Side::Buy, *price))
            .chain(strategy.sell_levels.iter().map(|price| (Side::Sell, *price)));

        for (side, price) in placements {
            let request =
                OrderRequest::limit(&strategy.symbol, side, strategy.quantity_per_level, price);
            let result = self.submitter.submit(request).await;
            let failed = result.is_failed();
            telemetry::record_grid_level(failed);

            if failed {
                tracing::warn!(
                    strategy_id = %strategy.id,
                    %side,
                    %price,
                    error = result.error_message().unwrap_or_default(),
                    "Grid level placement failed"
                );
            }

            strategy.state.write().await.orders.push(result);
        }

        let snapshot = strategy.snapshot().await;
        tracing::info!(
            strategy_id = %strategy.id,
            placed = snapshot.resting_orders().count(),
            failed = snapshot.failed_levels(),
            "Grid placed"
        );
    }
}

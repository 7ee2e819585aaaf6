//! Order manager
//!
//! The surface callers use: immediate orders go straight to the submitter,
//! strategies go through their engines and land in the shared registry.

use crate::config::StrategyConfig;
use crate::execution::{
    Exchange, ExchangeError, OpenOrder, OrderRequest, OrderResult, OrderSubmitter, OrderType, Side,
};
use crate::strategy::{
    GridEngine, GridParams, Strategy, StrategyError, StrategyRegistry, StrategySnapshot,
    TwapEngine, TwapParams,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Stop leg of an OCO pair.
///
/// Only recorded; it is never sent to the exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcoStopLeg {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub stop_price: Decimal,
    pub stop_limit_price: Decimal,
    pub recorded_at: DateTime<Utc>,
}

pub struct OrderManager {
    submitter: OrderSubmitter,
    registry: Arc<StrategyRegistry>,
    twap: TwapEngine,
    grid: GridEngine,
    oco_legs: DashMap<String, OcoStopLeg>,
    default_twap_interval: Duration,
}

impl OrderManager {
    pub fn new(exchange: Arc<dyn Exchange>, config: &StrategyConfig) -> Self {
        let submitter = OrderSubmitter::new(exchange);
        let registry = Arc::new(StrategyRegistry::new());
        Self {
            twap: TwapEngine::new(submitter.clone(), registry.clone()),
            grid: GridEngine::new(submitter.clone(), registry.clone(), config.max_grid_levels),
            submitter,
            registry,
            oco_legs: DashMap::new(),
            default_twap_interval: config.default_twap_interval(),
        }
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    pub async fn place_market_order(&self, symbol: &str, side: Side, quantity: Decimal) -> OrderResult {
        self.submitter
            .submit(OrderRequest::market(symbol, side, quantity))
            .await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> OrderResult {
        self.submitter
            .submit(OrderRequest::limit(symbol, side, quantity, price))
            .await
    }

    /// Stop-market order; the result carries the stop price
    pub async fn place_stop_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> OrderResult {
        self.submitter
            .submit(OrderRequest::stop_market(symbol, side, quantity, stop_price))
            .await
    }

    /// Place the limit leg of an OCO pair and record the stop leg against it.
    ///
    /// The stop leg is kept as metadata only and is never submitted.
    pub async fn place_oco_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
        stop_limit_price: Decimal,
    ) -> OrderResult {
        tracing::info!(%symbol, %side, %quantity, %price, %stop_price, "Placing OCO order");

        let result = self
            .place_limit_order(symbol, side, quantity, price)
            .await
            .with_order_type(OrderType::Oco);

        if !result.is_failed() {
            self.oco_legs.insert(
                result.order_id().to_string(),
                OcoStopLeg {
                    symbol: symbol.to_string(),
                    side,
                    quantity,
                    stop_price,
                    stop_limit_price,
                    recorded_at: Utc::now(),
                },
            );
            tracing::debug!(order_id = %result.order_id(), "Recorded OCO stop leg");
        }

        result
    }

    pub fn oco_stop_leg(&self, order_id: &str) -> Option<OcoStopLeg> {
        self.oco_legs.get(order_id).map(|leg| leg.value().clone())
    }

    /// Launch a TWAP; `interval` falls back to the configured default
    pub fn start_twap(
        &self,
        symbol: &str,
        side: Side,
        total_quantity: Decimal,
        duration: Duration,
        interval: Option<Duration>,
    ) -> Result<String, StrategyError> {
        self.twap.start(TwapParams {
            symbol: symbol.to_string(),
            side,
            total_quantity,
            duration,
            interval: interval.unwrap_or(self.default_twap_interval),
        })
    }

    /// Place a grid; returns once every level has been attempted
    pub async fn start_grid(
        &self,
        symbol: &str,
        lower_price: Decimal,
        upper_price: Decimal,
        levels: u32,
        quantity_per_level: Decimal,
    ) -> Result<String, StrategyError> {
        self.grid
            .start(GridParams {
                symbol: symbol.to_string(),
                lower_price,
                upper_price,
                levels,
                quantity_per_level,
            })
            .await
    }

    fn strategy(&self, id: &str) -> Result<Strategy, StrategyError> {
        self.registry
            .get(id)
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))
    }

    pub async fn get_strategy_status(&self, id: &str) -> Result<StrategySnapshot, StrategyError> {
        Ok(self.strategy(id)?.status().await)
    }

    /// Stop a strategy.
    ///
    /// `Ok(false)` means it had already stopped. Grids also have their
    /// resting orders cancelled on the exchange.
    pub async fn cancel_strategy(&self, id: &str) -> Result<bool, StrategyError> {
        let cancelled = self.strategy(id)?.cancel().await;
        if cancelled {
            self.registry.publish_active_count().await;
        }
        tracing::info!(strategy_id = %id, cancelled, "Cancel requested");
        Ok(cancelled)
    }

    /// Resolve once a TWAP has finished; grids resolve immediately
    pub async fn wait_for_strategy(&self, id: &str) -> Result<StrategySnapshot, StrategyError> {
        let strategy = self.strategy(id)?;
        if let Strategy::Twap(twap) = &strategy {
            twap.wait_until_done().await;
        }
        Ok(strategy.status().await)
    }

    pub async fn list_active_strategies(&self) -> Vec<StrategySnapshot> {
        self.registry.list_active().await
    }

    pub async fn account_balance(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        self.submitter.exchange().get_account_balance().await
    }

    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.submitter.exchange().get_open_orders(symbol).await
    }
}

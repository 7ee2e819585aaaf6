//! Shared test fixtures

use algo_exec::config::StrategyConfig;
use algo_exec::execution::{Exchange, ExchangeError, OpenOrder, OrderAck, OrderRequest, PaperExchange};
use algo_exec::manager::OrderManager;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Paper exchange with scripted rejections, latency and a call log
pub struct ScriptedExchange {
    inner: PaperExchange,
    reject_calls: HashSet<usize>,
    latency: Duration,
    calls: Mutex<Vec<(Instant, Instant)>>,
}

impl ScriptedExchange {
    pub async fn new() -> Self {
        let inner = PaperExchange::new(dec!(0));
        inner.set_price("BTCUSDT", dec!(60000)).await;
        inner.set_price("ETHUSDT", dec!(2000)).await;
        Self {
            inner,
            reject_calls: HashSet::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(vec![]),
        }
    }

    /// Reject these submissions, counted from 1
    pub fn rejecting(mut self, calls: &[usize]) -> Self {
        self.reject_calls = calls.iter().copied().collect();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn paper(&self) -> &PaperExchange {
        &self.inner
    }

    /// (start, end) of every submission, in call order
    pub fn calls(&self) -> Vec<(Instant, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for ScriptedExchange {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let started = Instant::now();
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((started, started));
            calls.len()
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = if self.reject_calls.contains(&call) {
            Err(ExchangeError::Rejected(
                "Margin is insufficient".to_string(),
            ))
        } else {
            self.inner.submit_order(request).await
        };

        self.calls.lock().unwrap()[call - 1].1 = Instant::now();
        response
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.inner.get_current_price(symbol).await
    }

    async fn get_account_balance(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        self.inner.get_account_balance().await
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<bool, ExchangeError> {
        self.inner.cancel_order(symbol, order_id).await
    }

    async fn get_open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.inner.get_open_orders(symbol).await
    }
}

pub fn manager_with(exchange: Arc<ScriptedExchange>) -> OrderManager {
    OrderManager::new(exchange, &StrategyConfig::default())
}

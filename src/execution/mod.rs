//! Execution module
//!
//! The exchange collaborator boundary, the paper exchange, and the order
//! submitter that turns every submission into an [`OrderResult`].

mod paper;
mod submitter;
mod types;

pub use paper::PaperExchange;
pub use submitter::OrderSubmitter;
pub use types::{
    FailureKind, Fill, OpenOrder, OrderAck, OrderOutcome, OrderRequest, OrderResult, OrderType,
    Side, FAILED_STATUS,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by an exchange connection
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// The exchange refused the request
    #[error("order rejected: {0}")]
    Rejected(String),
    /// The exchange could not be reached or refused the credentials
    #[error("connectivity error: {0}")]
    Connectivity(String),
}

impl ExchangeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExchangeError::Rejected(_) => FailureKind::Rejected,
            ExchangeError::Connectivity(_) => FailureKind::Connectivity,
        }
    }
}

/// Trading venue connection consumed by the strategies.
///
/// Implementations must be safe to share between concurrently running
/// strategy tasks.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Submit a primitive order
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError>;
    /// Latest traded price for a symbol
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;
    /// Balances by asset
    async fn get_account_balance(&self) -> Result<HashMap<String, Decimal>, ExchangeError>;
    /// Cancel a resting order; `Ok(false)` if it was not open
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<bool, ExchangeError>;
    /// Orders still resting on the book, optionally for one symbol
    async fn get_open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>, ExchangeError>;
}

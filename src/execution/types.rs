//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status string reported for submissions that never reached the book
pub const FAILED_STATUS: &str = "FAILED";

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}', expected BUY or SELL", other)),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order (immediate execution)
    Market,
    /// Limit order (price specified, good till cancelled)
    Limit,
    /// Stop order that triggers a market order at the stop price
    StopMarket,
    /// Limit leg of a one-cancels-other pair
    Oco,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::Oco => "OCO",
        }
    }

    /// Whether the exchange needs a price for this order type
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A primitive order as handed to the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Limit price, or trigger price for stop orders
    pub price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
        }
    }

    pub fn stop_market(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::StopMarket,
            quantity,
            price: Some(stop_price),
        }
    }
}

/// Exchange acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    /// Exchange-reported status (NEW, FILLED, ...)
    pub status: String,
}

/// An order resting on the book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub status: String,
}

/// A simulated execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub fees: Decimal,
}

/// Why a submission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Business rejection from the exchange
    Rejected,
    /// Transport or authentication failure
    Connectivity,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Rejected => "rejected",
            FailureKind::Connectivity => "connectivity",
        }
    }
}

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrderOutcome {
    Accepted { order_id: String, status: String },
    Failed { kind: FailureKind, message: String },
}

/// Immutable record of one primitive order submission.
///
/// A failed submission carries no order id and always carries a message;
/// an accepted one is the reverse. The accessors derive both from `outcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: OrderOutcome,
}

impl OrderResult {
    pub fn accepted(request: &OrderRequest, ack: OrderAck) -> Self {
        Self::from_request(
            request,
            OrderOutcome::Accepted {
                order_id: ack.order_id,
                status: ack.status,
            },
        )
    }

    pub fn failed(request: &OrderRequest, kind: FailureKind, message: impl Into<String>) -> Self {
        Self::from_request(
            request,
            OrderOutcome::Failed {
                kind,
                message: message.into(),
            },
        )
    }

    fn from_request(request: &OrderRequest, outcome: OrderOutcome) -> Self {
        Self {
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            timestamp: Utc::now(),
            outcome,
        }
    }

    /// Relabel the order type, keeping everything else
    pub fn with_order_type(self, order_type: OrderType) -> Self {
        Self { order_type, ..self }
    }

    /// Exchange order id, empty if the order was never accepted
    pub fn order_id(&self) -> &str {
        match &self.outcome {
            OrderOutcome::Accepted { order_id, .. } => order_id,
            OrderOutcome::Failed { .. } => "",
        }
    }

    pub fn status(&self) -> &str {
        match &self.outcome {
            OrderOutcome::Accepted { status, .. } => status,
            OrderOutcome::Failed { .. } => FAILED_STATUS,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            OrderOutcome::Accepted { .. } => None,
            OrderOutcome::Failed { message, .. } => Some(message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            OrderOutcome::Accepted { .. } => None,
            OrderOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, OrderOutcome::Failed { .. })
    }
}

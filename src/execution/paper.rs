//! Paper trading exchange with simulated fills

use super::{Exchange, ExchangeError, Fill, OpenOrder, OrderAck, OrderRequest, OrderType};
use crate::config::PaperConfig;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory venue.
///
/// Market orders fill immediately at the reference price for their symbol.
/// Limit and stop orders rest until cancelled.
pub struct PaperExchange {
    fee_rate: Decimal,
    prices: RwLock<HashMap<String, Decimal>>,
    balances: RwLock<HashMap<String, Decimal>>,
    open_orders: RwLock<BTreeMap<u64, OpenOrder>>,
    fills: RwLock<Vec<Fill>>,
    next_order_id: AtomicU64,
    submissions: AtomicU64,
    offline: AtomicBool,
}

impl PaperExchange {
    /// Create a new paper exchange with no listed symbols
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            prices: RwLock::new(HashMap::new()),
            balances: RwLock::new(HashMap::new()),
            open_orders: RwLock::new(BTreeMap::new()),
            fills: RwLock::new(vec![]),
            next_order_id: AtomicU64::new(1),
            submissions: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Build an exchange from the `[paper]` config section
    pub fn from_config(config: &PaperConfig) -> Self {
        let exchange = Self::new(config.fee_rate);
        let prices = config
            .prices
            .iter()
            .map(|(symbol, price)| (symbol.to_uppercase(), *price))
            .collect();
        Self {
            prices: RwLock::new(prices),
            balances: RwLock::new(config.balances.clone()),
            ..exchange
        }
    }

    /// Set the reference price for a symbol, listing it if needed
    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.write().await.insert(symbol.to_uppercase(), price);
    }

    pub async fn set_balance(&self, asset: &str, amount: Decimal) {
        self.balances.write().await.insert(asset.to_string(), amount);
    }

    /// Simulate a lost connection
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `submit_order` calls received, accepted or not
    pub fn submission_count(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    pub async fn get_fills(&self) -> Vec<Fill> {
        self.fills.read().await.clone()
    }

    fn ensure_online(&self) -> Result<(), ExchangeError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ExchangeError::Connectivity(
                "paper exchange is offline".to_string(),
            ));
        }
        Ok(())
    }

    async fn reference_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.prices
            .read()
            .await
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| ExchangeError::Rejected(format!("Invalid symbol: {}", symbol)))
    }

    fn validate(request: &OrderRequest) -> Result<(), ExchangeError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ExchangeError::Rejected(
                "Quantity less than or equal to zero".to_string(),
            ));
        }
        if request.order_type == OrderType::Oco {
            return Err(ExchangeError::Rejected(
                "Order type OCO is not supported by this endpoint".to_string(),
            ));
        }
        if request.order_type.requires_price() {
            match request.price {
                None => {
                    return Err(ExchangeError::Rejected(format!(
                        "Mandatory parameter 'price' was not sent for {} order",
                        request.order_type
                    )))
                }
                Some(price) if price <= Decimal::ZERO => {
                    return Err(ExchangeError::Rejected(
                        "Price less than or equal to zero".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Exchange for PaperExchange {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        Self::validate(request)?;
        let reference = self.reference_price(&request.symbol).await?;

        let fees = if request.order_type == OrderType::Market {
            request
                .quantity
                .checked_mul(reference)
                .and_then(|notional| notional.checked_mul(self.fee_rate))
                .ok_or_else(|| ExchangeError::Rejected("notional overflow".to_string()))?
        } else {
            Decimal::ZERO
        };

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order_id = id.to_string();

        if request.order_type == OrderType::Market {
            let fill = Fill {
                order_id: order_id.clone(),
                symbol: request.symbol.clone(),
                side: request.side,
                price: reference,
                quantity: request.quantity,
                timestamp: Utc::now(),
                fees,
            };
            self.fills.write().await.push(fill);

            tracing::debug!(%order_id, price = %reference, "Paper market order filled");
            return Ok(OrderAck {
                order_id,
                status: "FILLED".to_string(),
            });
        }

        let open = OpenOrder {
            order_id: order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            status: "NEW".to_string(),
        };
        self.open_orders.write().await.insert(id, open);

        tracing::debug!(%order_id, order_type = %request.order_type, "Paper order resting");
        Ok(OrderAck {
            order_id,
            status: "NEW".to_string(),
        })
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.ensure_online()?;
        self.reference_price(symbol).await
    }

    async fn get_account_balance(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        self.ensure_online()?;
        Ok(self.balances.read().await.clone())
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<bool, ExchangeError> {
        self.ensure_online()?;
        let Ok(id) = order_id.parse::<u64>() else {
            return Ok(false);
        };

        let mut open_orders = self.open_orders.write().await;
        match open_orders.get(&id) {
            Some(order) if order.symbol.eq_ignore_ascii_case(symbol) => {
                open_orders.remove(&id);
                tracing::info!(%order_id, %symbol, "Paper order cancelled");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.ensure_online()?;
        let open_orders = self.open_orders.read().await;
        Ok(open_orders
            .values()
            .filter(|o| symbol.map_or(true, |s| o.symbol.eq_ignore_ascii_case(s)))
            .cloned()
            .collect())
    }
}

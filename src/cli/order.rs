//! Single order commands

use super::print_json;
use crate::execution::{OrderResult, Side};
use crate::manager::OrderManager;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct MarketArgs {
    /// Trading pair, e.g. BTCUSDT
    pub symbol: String,
    /// BUY or SELL
    pub side: Side,
    pub quantity: Decimal,
}

#[derive(Args, Debug)]
pub struct LimitArgs {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Trigger price
    pub stop_price: Decimal,
}

#[derive(Args, Debug)]
pub struct OcoArgs {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// Limit leg price
    pub price: Decimal,
    pub stop_price: Decimal,
    pub stop_limit_price: Decimal,
}

impl MarketArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let result = manager
            .place_market_order(&self.symbol.to_uppercase(), self.side, self.quantity)
            .await;
        report(&result)
    }
}

impl LimitArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let result = manager
            .place_limit_order(&self.symbol.to_uppercase(), self.side, self.quantity, self.price)
            .await;
        report(&result)
    }
}

impl StopArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let result = manager
            .place_stop_order(
                &self.symbol.to_uppercase(),
                self.side,
                self.quantity,
                self.stop_price,
            )
            .await;
        report(&result)
    }
}

impl OcoArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let result = manager
            .place_oco_order(
                &self.symbol.to_uppercase(),
                self.side,
                self.quantity,
                self.price,
                self.stop_price,
                self.stop_limit_price,
            )
            .await;
        report(&result)?;
        if let Some(leg) = manager.oco_stop_leg(result.order_id()) {
            print_json(&leg)?;
        }
        Ok(())
    }
}

fn report(result: &OrderResult) -> anyhow::Result<()> {
    print_json(result)?;
    if let Some(message) = result.error_message() {
        anyhow::bail!("order failed: {}", message);
    }
    Ok(())
}

//! Strategy commands

use super::print_json;
use crate::execution::Side;
use crate::manager::OrderManager;
use clap::Args;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct TwapArgs {
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,

    /// Total run time in minutes
    #[arg(long)]
    pub duration_mins: u64,

    /// Seconds between slices (defaults to the configured interval)
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

impl TwapArgs {
    pub fn duration(&self) -> anyhow::Result<Duration> {
        let secs = self
            .duration_mins
            .checked_mul(60)
            .ok_or_else(|| anyhow::anyhow!("--duration-mins {} is too large", self.duration_mins))?;
        Ok(Duration::from_secs(secs))
    }

    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let id = manager.start_twap(
            &self.symbol.to_uppercase(),
            self.side,
            self.total_quantity,
            self.duration()?,
            self.interval_secs.map(Duration::from_secs),
        )?;
        tracing::info!(strategy_id = %id, "TWAP running, Ctrl-C to cancel");

        let snapshot = tokio::select! {
            snapshot = manager.wait_for_strategy(&id) => snapshot?,
            _ = tokio::signal::ctrl_c() => {
                manager.cancel_strategy(&id).await?;
                manager.wait_for_strategy(&id).await?
            }
        };

        print_json(&snapshot)
    }
}

#[derive(Args, Debug)]
pub struct GridArgs {
    pub symbol: String,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub levels: u32,
    pub quantity_per_level: Decimal,
}

impl GridArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let id = manager
            .start_grid(
                &self.symbol.to_uppercase(),
                self.lower_price,
                self.upper_price,
                self.levels,
                self.quantity_per_level,
            )
            .await?;

        print_json(&manager.get_strategy_status(&id).await?)
    }
}

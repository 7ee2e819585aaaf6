//! Account commands

use super::print_json;
use crate::manager::OrderManager;
use clap::Args;

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Only show open orders for this symbol
    #[arg(long)]
    pub symbol: Option<String>,
}

impl BalanceArgs {
    pub async fn execute(&self, manager: &OrderManager) -> anyhow::Result<()> {
        let balances = manager.account_balance().await?;
        let mut assets: Vec<_> = balances.into_iter().filter(|(_, amount)| !amount.is_zero()).collect();
        assets.sort();
        for (asset, amount) in &assets {
            println!("{}: {:.4}", asset, amount);
        }

        let symbol = self.symbol.as_deref().map(str::to_uppercase);
        let open_orders = manager.open_orders(symbol.as_deref()).await?;
        print_json(&open_orders)
    }
}

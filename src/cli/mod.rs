//! CLI interface for algo-exec
//!
//! Provides subcommands for:
//! - `market`, `limit`, `stop`, `oco`: place a single order
//! - `twap`: slice an order over time and wait for it to finish
//! - `grid`: place a grid of resting limit orders
//! - `balance`: show balances and open orders
//! - `config`: show the effective configuration

mod account;
mod order;
mod strategy;

pub use account::BalanceArgs;
pub use order::{LimitArgs, MarketArgs, OcoArgs, StopArgs};
pub use strategy::{GridArgs, TwapArgs};

use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "algo-exec")]
#[command(about = "TWAP and grid execution on a paper futures venue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Place a market order
    Market(MarketArgs),
    /// Place a limit order
    Limit(LimitArgs),
    /// Place a stop-market order
    Stop(StopArgs),
    /// Place an OCO order (limit leg placed, stop leg recorded)
    Oco(OcoArgs),
    /// Run a TWAP until it completes or Ctrl-C
    Twap(TwapArgs),
    /// Place a grid of limit orders
    Grid(GridArgs),
    /// Show balances and open orders
    Balance(BalanceArgs),
    /// Show configuration
    Config,
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

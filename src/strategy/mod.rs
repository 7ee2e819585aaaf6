//! Execution strategies
//!
//! TWAP slicing and grid placement, plus the registry both of them report
//! into. A [`Strategy`] is a cheap, cloneable handle onto shared state;
//! readers always get an owned [`StrategySnapshot`].

mod grid;
mod registry;
mod twap;

pub use grid::{classify_levels, grid_levels, GridEngine, GridParams, GridSnapshot, GridStrategy};
pub use registry::StrategyRegistry;
pub use twap::{slice_count, TwapEngine, TwapParams, TwapSnapshot, TwapStrategy};

use crate::execution::ExchangeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Strategy lifecycle errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Parameters rejected before any order was placed
    #[error("invalid strategy parameters: {0}")]
    Validation(String),
    /// No strategy registered under this id
    #[error("strategy not found: {0}")]
    NotFound(String),
    /// Reference price could not be read at creation
    #[error("could not read price for {symbol}: {source}")]
    PriceUnavailable {
        symbol: String,
        #[source]
        source: ExchangeError,
    },
}

/// Why a strategy stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every scheduled slice was attempted
    Completed,
    /// Remaining quantity reached zero before the schedule ended
    Depleted,
    /// Stopped on request
    Cancelled,
    /// The run's task ended without finishing, e.g. on a panic
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Twap,
    Grid,
}

/// Handle onto a registered strategy
#[derive(Clone)]
pub enum Strategy {
    Twap(Arc<TwapStrategy>),
    Grid(Arc<GridStrategy>),
}

impl Strategy {
    pub fn id(&self) -> &str {
        match self {
            Strategy::Twap(twap) => &twap.id,
            Strategy::Grid(grid) => &grid.id,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Twap(_) => StrategyKind::Twap,
            Strategy::Grid(_) => StrategyKind::Grid,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            Strategy::Twap(twap) => twap.started_at,
            Strategy::Grid(grid) => grid.started_at,
        }
    }

    /// Consistent copy of the current state
    pub async fn status(&self) -> StrategySnapshot {
        match self {
            Strategy::Twap(twap) => StrategySnapshot::Twap(twap.snapshot().await),
            Strategy::Grid(grid) => StrategySnapshot::Grid(grid.snapshot().await),
        }
    }

    pub async fn is_active(&self) -> bool {
        match self {
            Strategy::Twap(twap) => twap.is_active().await,
            Strategy::Grid(grid) => grid.is_active().await,
        }
    }

    /// Ask the strategy to stop.
    ///
    /// A TWAP stops at its next slice boundary. A grid is marked inactive
    /// and its resting orders are cancelled on the exchange. Returns `false`
    /// if the strategy had already stopped.
    pub async fn cancel(&self) -> bool {
        match self {
            Strategy::Twap(twap) => twap.request_cancel().await,
            Strategy::Grid(grid) => grid.cancel().await,
        }
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}

/// Point-in-time view of a strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategySnapshot {
    Twap(TwapSnapshot),
    Grid(GridSnapshot),
}

impl StrategySnapshot {
    pub fn id(&self) -> &str {
        match self {
            StrategySnapshot::Twap(twap) => &twap.id,
            StrategySnapshot::Grid(grid) => &grid.id,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            StrategySnapshot::Twap(twap) => twap.active,
            StrategySnapshot::Grid(grid) => grid.active,
        }
    }

    pub fn as_twap(&self) -> Option<&TwapSnapshot> {
        match self {
            StrategySnapshot::Twap(twap) => Some(twap),
            StrategySnapshot::Grid(_) => None,
        }
    }

    pub fn as_grid(&self) -> Option<&GridSnapshot> {
        match self {
            StrategySnapshot::Grid(grid) => Some(grid),
            StrategySnapshot::Twap(_) => None,
        }
    }
}

/// Unique id in the form `<prefix>_<symbol>_<unix millis>_<suffix>`
pub(crate) fn new_strategy_id(prefix: &str, symbol: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}",
        prefix,
        symbol,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

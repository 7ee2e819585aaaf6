//! Process-wide strategy registry

use super::{Strategy, StrategySnapshot};
use crate::telemetry;
use dashmap::DashMap;

/// Maps strategy ids to their handles.
///
/// The map is sharded, and each strategy guards its own state, so a slow
/// writer on one strategy never blocks readers of another. Map guards are
/// released before any `.await`.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: DashMap<String, Strategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, strategy: Strategy) {
        tracing::debug!(strategy_id = %strategy.id(), kind = ?strategy.kind(), "Registering strategy");
        self.strategies.insert(strategy.id().to_string(), strategy);
    }

    pub fn get(&self, id: &str) -> Option<Strategy> {
        self.strategies.get(id).map(|entry| entry.value().clone())
    }

    /// Every registered strategy, oldest first
    pub fn list(&self) -> Vec<Strategy> {
        let mut strategies: Vec<Strategy> = self
            .strategies
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        strategies.sort_by(|a, b| {
            a.started_at()
                .cmp(&b.started_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        strategies
    }

    /// Snapshots of the strategies that are still active, oldest first
    pub async fn list_active(&self) -> Vec<StrategySnapshot> {
        let mut active = Vec::new();
        for strategy in self.list() {
            let snapshot = strategy.status().await;
            if snapshot.is_active() {
                active.push(snapshot);
            }
        }
        active
    }

    pub async fn active_count(&self) -> usize {
        let mut count = 0;
        for strategy in self.list() {
            if strategy.is_active().await {
                count += 1;
            }
        }
        count
    }

    /// Refresh the active-strategies gauge
    pub async fn publish_active_count(&self) {
        telemetry::set_active_strategies(self.active_count().await);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

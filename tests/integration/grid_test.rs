//! Grid placement and cancellation through the order manager

use crate::common::{manager_with, ScriptedExchange};
use algo_exec::execution::{OrderType, Side};
use algo_exec::strategy::{StopReason, StrategyError};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_grid_straddles_reference_price() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_grid("BTCUSDT", dec!(58000), dec!(62000), 5, dec!(0.01))
        .await
        .unwrap();
    assert!(id.starts_with("grid_BTCUSDT_"));

    let snapshot = manager.get_strategy_status(&id).await.unwrap();
    let grid = snapshot.as_grid().unwrap();

    assert!(grid.active);
    assert_eq!(grid.reference_price, dec!(60000));
    assert_eq!(grid.buy_levels, vec![dec!(58000), dec!(59000)]);
    assert_eq!(grid.sell_levels, vec![dec!(60000), dec!(61000), dec!(62000)]);

    // Buys first, then sells, ascending within each side
    let placed: Vec<_> = grid.orders.iter().map(|o| (o.side, o.price)).collect();
    assert_eq!(
        placed,
        vec![
            (Side::Buy, Some(dec!(58000))),
            (Side::Buy, Some(dec!(59000))),
            (Side::Sell, Some(dec!(60000))),
            (Side::Sell, Some(dec!(61000))),
            (Side::Sell, Some(dec!(62000))),
        ]
    );
    assert!(grid
        .orders
        .iter()
        .all(|o| o.order_type == OrderType::Limit && o.quantity == dec!(0.01)));

    let open = manager.open_orders(Some("BTCUSDT")).await.unwrap();
    assert_eq!(open.len(), 5);
}

#[tokio::test]
async fn test_grid_entirely_below_market_is_all_buys() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange);

    let id = assert_ok!(
        manager
            .start_grid("ETHUSDT", dec!(1500), dec!(1900), 3, dec!(1))
            .await
    );
    let snapshot = manager.get_strategy_status(&id).await.unwrap();
    let grid = snapshot.as_grid().unwrap();

    assert_eq!(grid.buy_levels.len(), 3);
    assert!(grid.sell_levels.is_empty());
    assert!(grid.orders.iter().all(|o| o.side == Side::Buy));
}

#[tokio::test]
async fn test_failed_level_does_not_stop_placement() {
    let exchange = Arc::new(ScriptedExchange::new().await.rejecting(&[3]));
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_grid("BTCUSDT", dec!(58000), dec!(62000), 5, dec!(0.01))
        .await
        .unwrap();
    let snapshot = manager.get_strategy_status(&id).await.unwrap();
    let grid = snapshot.as_grid().unwrap();

    assert_eq!(grid.orders.len(), 5);
    assert_eq!(grid.failed_levels(), 1);
    assert!(grid.orders[2].is_failed());
    assert_eq!(grid.resting_orders().count(), 4);
    assert_eq!(exchange.calls().len(), 5);
}

#[tokio::test]
async fn test_price_read_failure_places_nothing() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let err = manager
        .start_grid("DOGEUSDT", dec!(0.1), dec!(0.2), 5, dec!(100))
        .await
        .unwrap_err();

    assert!(matches!(err, StrategyError::PriceUnavailable { ref symbol, .. } if symbol == "DOGEUSDT"));
    assert!(exchange.calls().is_empty());
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn test_invalid_grid_is_rejected_up_front() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    for (lower, upper, levels) in [
        (dec!(62000), dec!(58000), 5),
        (dec!(60000), dec!(60000), 5),
        (dec!(58000), dec!(62000), 1),
        (dec!(58000), dec!(62000), 1000),
    ] {
        let result = manager
            .start_grid("BTCUSDT", lower, upper, levels, dec!(0.01))
            .await;
        assert!(matches!(result, Err(StrategyError::Validation(_))));
    }
    assert!(exchange.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_grid_pulls_resting_orders() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_grid("BTCUSDT", dec!(58000), dec!(62000), 5, dec!(0.01))
        .await
        .unwrap();
    assert_eq!(manager.list_active_strategies().await.len(), 1);

    assert!(manager.cancel_strategy(&id).await.unwrap());

    let snapshot = manager.get_strategy_status(&id).await.unwrap();
    let grid = snapshot.as_grid().unwrap();
    assert!(!grid.active);
    assert_eq!(grid.stop_reason, Some(StopReason::Cancelled));
    assert!(grid.finished_at.is_some());
    // Placement history is kept
    assert_eq!(grid.orders.len(), 5);

    assert!(manager.open_orders(None).await.unwrap().is_empty());
    assert!(manager.list_active_strategies().await.is_empty());
    assert!(!manager.cancel_strategy(&id).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_grid_is_registered_once_every_level_is_placed() {
    let exchange = Arc::new(
        ScriptedExchange::new()
            .await
            .with_latency(Duration::from_secs(2)),
    );
    let manager = manager_with(exchange.clone());

    let (id, mid_placement) = tokio::join!(
        manager.start_grid("BTCUSDT", dec!(58000), dec!(62000), 5, dec!(0.01)),
        async {
            // Third level is in flight
            tokio::time::sleep(Duration::from_secs(5)).await;
            (
                exchange.calls().len(),
                manager.list_active_strategies().await.len(),
            )
        }
    );
    let id = id.unwrap();

    assert_eq!(mid_placement, (3, 0));

    let active = manager.list_active_strategies().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), id);
    assert_eq!(active[0].as_grid().unwrap().orders.len(), 5);
}

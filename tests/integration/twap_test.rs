//! TWAP runs driven through the order manager on paused time

use crate::common::{manager_with, ScriptedExchange};
use algo_exec::execution::{OrderType, Side, FAILED_STATUS};
use algo_exec::strategy::StopReason;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn test_five_minute_twap_runs_to_completion() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1.0), 5 * MINUTE, Some(MINUTE))
        .unwrap();
    assert!(id.starts_with("twap_BTCUSDT_"));

    let snapshot = manager.wait_for_strategy(&id).await.unwrap();
    let twap = snapshot.as_twap().unwrap();

    assert!(!twap.active);
    assert_eq!(twap.stop_reason, Some(StopReason::Completed));
    assert_eq!(twap.slice_count, 5);
    assert_eq!(twap.quantity_per_slice, dec!(0.2));
    assert_eq!(twap.orders.len(), 5);
    assert!(twap
        .orders
        .iter()
        .all(|o| o.order_type == OrderType::Market && o.quantity == dec!(0.2)));
    assert_eq!(twap.remaining_quantity, dec!(0));
    assert_eq!(twap.executed_quantity(), dec!(1.0));

    // Slices are spaced one interval apart with no sleep after the last
    let calls = exchange.calls();
    assert_eq!(calls.len(), 5);
    for pair in calls.windows(2) {
        let gap = pair[1].0 - pair[0].0;
        assert!(gap >= MINUTE && gap < MINUTE + Duration::from_secs(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_status_is_stable_between_slices() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange);

    let id = manager
        .start_twap("BTCUSDT", Side::Sell, dec!(1.0), 5 * MINUTE, Some(MINUTE))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;

    let first = manager.get_strategy_status(&id).await.unwrap();
    let second = manager.get_strategy_status(&id).await.unwrap();
    let (first, second) = (first.as_twap().unwrap(), second.as_twap().unwrap());

    assert_eq!(first.orders, second.orders);
    assert_eq!(first.remaining_quantity, second.remaining_quantity);
    assert_eq!(first.orders.len(), 2);
    assert_eq!(first.remaining_quantity, dec!(0.6));
    assert!(first.active);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_slice_does_not_stop_the_run() {
    let exchange = Arc::new(ScriptedExchange::new().await.rejecting(&[2]));
    let manager = manager_with(exchange);

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1.0), 5 * MINUTE, Some(MINUTE))
        .unwrap();
    let snapshot = manager.wait_for_strategy(&id).await.unwrap();
    let twap = snapshot.as_twap().unwrap();

    assert_eq!(twap.orders.len(), 5);
    assert_eq!(twap.failed_slices(), 1);
    assert_eq!(twap.orders[1].status(), FAILED_STATUS);
    assert_eq!(
        twap.orders[1].error_message(),
        Some("order rejected: Margin is insufficient")
    );
    // Failed slices still count against the schedule
    assert_eq!(twap.remaining_quantity, dec!(0));
    assert_eq!(twap.accepted_quantity(), dec!(0.8));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_at_slice_boundary() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_twap("ETHUSDT", Side::Buy, dec!(10), 10 * MINUTE, Some(MINUTE))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(150)).await;

    assert!(manager.cancel_strategy(&id).await.unwrap());
    let snapshot = manager.wait_for_strategy(&id).await.unwrap();
    let twap = snapshot.as_twap().unwrap();

    assert!(!twap.active);
    assert_eq!(twap.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(twap.orders.len(), 3);
    assert_eq!(twap.remaining_quantity, dec!(7));
    assert_eq!(exchange.calls().len(), 3);

    // Second cancel is a no-op
    assert!(!manager.cancel_strategy(&id).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_slice_completes_after_cancel() {
    let exchange = Arc::new(
        ScriptedExchange::new()
            .await
            .with_latency(Duration::from_secs(10)),
    );
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1.0), 5 * MINUTE, Some(MINUTE))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(manager.cancel_strategy(&id).await.unwrap());
    let snapshot = manager.wait_for_strategy(&id).await.unwrap();
    let twap = snapshot.as_twap().unwrap();

    assert_eq!(twap.orders.len(), 1);
    assert!(!twap.orders[0].is_failed());
    assert_eq!(twap.remaining_quantity, dec!(0.8));
    assert_eq!(twap.stop_reason, Some(StopReason::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_slow_exchange_never_overlaps_slices() {
    let exchange = Arc::new(
        ScriptedExchange::new()
            .await
            .with_latency(Duration::from_secs(5)),
    );
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1.0), 4 * MINUTE, Some(MINUTE))
        .unwrap();
    manager.wait_for_strategy(&id).await.unwrap();

    let calls = exchange.calls();
    assert_eq!(calls.len(), 4);
    for pair in calls.windows(2) {
        assert!(pair[0].1 <= pair[1].0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_interval_longer_than_duration() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1.0), Duration::from_secs(30), Some(MINUTE))
        .unwrap();
    let snapshot = manager.get_strategy_status(&id).await.unwrap();
    let twap = snapshot.as_twap().unwrap();

    assert!(!twap.active);
    assert_eq!(twap.slice_count, 0);
    assert!(twap.orders.is_empty());
    assert_eq!(twap.remaining_quantity, dec!(1.0));
    assert!(exchange.calls().is_empty());
    assert!(manager.list_active_strategies().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_twaps_run_independently() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange.clone());

    let a = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1), 3 * MINUTE, Some(MINUTE))
        .unwrap();
    let b = manager
        .start_twap("ETHUSDT", Side::Sell, dec!(6), 6 * MINUTE, Some(MINUTE))
        .unwrap();
    assert_ne!(a, b);

    let active = manager.list_active_strategies().await;
    assert_eq!(active.len(), 2);

    let done_a = manager.wait_for_strategy(&a).await.unwrap();
    assert_eq!(done_a.as_twap().unwrap().orders.len(), 3);

    // b is still working through its schedule
    let running_b = manager.get_strategy_status(&b).await.unwrap();
    assert!(running_b.is_active());
    assert_eq!(running_b.as_twap().unwrap().symbol, "ETHUSDT");

    let done_b = manager.wait_for_strategy(&b).await.unwrap();
    assert_eq!(done_b.as_twap().unwrap().orders.len(), 6);
    assert_eq!(exchange.calls().len(), 9);
}

#[tokio::test]
async fn test_invalid_twap_registers_nothing() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange);

    assert!(manager
        .start_twap("BTCUSDT", Side::Buy, dec!(0), 5 * MINUTE, Some(MINUTE))
        .is_err());
    assert!(manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1), 5 * MINUTE, Some(Duration::ZERO))
        .is_err());
    assert!(manager.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_serializes_with_kind_tag() {
    let exchange = Arc::new(ScriptedExchange::new().await);
    let manager = manager_with(exchange);

    let id = manager
        .start_twap("BTCUSDT", Side::Buy, dec!(1), 2 * MINUTE, Some(MINUTE))
        .unwrap();
    let snapshot = manager.wait_for_strategy(&id).await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["kind"], "twap");
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["orders"].as_array().unwrap().len(), 2);
}

//! Order submitter
//!
//! Wraps an [`Exchange`] so that every submission yields exactly one
//! [`OrderResult`]. Exchange errors are folded into a failed outcome and
//! never reach the caller as `Err`.

use super::{Exchange, OrderRequest, OrderResult};
use crate::telemetry::{self, LatencyMetric};
use std::sync::Arc;
use std::time::Instant;

/// Stateless adapter around the shared exchange handle
#[derive(Clone)]
pub struct OrderSubmitter {
    exchange: Arc<dyn Exchange>,
}

impl OrderSubmitter {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        Self { exchange }
    }

    pub fn exchange(&self) -> &Arc<dyn Exchange> {
        &self.exchange
    }

    /// Submit one order and record its outcome
    pub async fn submit(&self, request: OrderRequest) -> OrderResult {
        tracing::info!(
            symbol = %request.symbol,
            side = %request.side,
            order_type = %request.order_type,
            quantity = %request.quantity,
            price = ?request.price,
            "Submitting order"
        );

        let started = Instant::now();
        let response = self.exchange.submit_order(&request).await;
        telemetry::record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let result = match response {
            Ok(ack) => {
                tracing::info!(
                    order_id = %ack.order_id,
                    status = %ack.status,
                    symbol = %request.symbol,
                    "Order accepted"
                );
                OrderResult::accepted(&request, ack)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    kind = e.kind().as_str(),
                    symbol = %request.symbol,
                    order_type = %request.order_type,
                    "Order failed"
                );
                OrderResult::failed(&request, e.kind(), e.to_string())
            }
        };

        telemetry::record_order_outcome(&result);
        result
    }
}

//! algo-exec: execution strategies for a futures trading venue
//!
//! This library provides:
//! - An order submitter that turns every primitive order into an `OrderResult`
//! - TWAP slicing run as independent background tasks
//! - Grid placement across evenly spaced price levels
//! - A concurrent strategy registry with cooperative cancellation
//! - A paper exchange implementing the exchange boundary
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod execution;
pub mod manager;
pub mod strategy;
pub mod telemetry;

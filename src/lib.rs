//! pos_ledger - Order ledger for a point-of-sale till
//!
//! Completed orders are stored one row per line item in a single table
//! file, with a derived per-day running total kept exact across appends
//! and out-of-order deletions.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (OrderId, Amount, Quantity)
//! - [`models`] - Order and LineItem with derived totals
//! - [`error`] - Ledger error taxonomy
//! - [`ledger`] - Row codec, writer, reader, compactor and the [`Ledger`] handle
//! - [`report`] - Date-range aggregation
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing setup

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod report;

// Convenient re-exports at crate root
pub use config::{AppConfig, LedgerConfig};
pub use core_types::{Amount, OrderId, Quantity};
pub use error::LedgerError;
pub use ledger::{Ledger, LoadReport, SkippedRow};
pub use models::{LineItem, Order};
pub use report::{DailySummary, RangeSummary};

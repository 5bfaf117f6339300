//! Core types used throughout the ledger
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

use rust_decimal::Decimal;

/// Order ID - opaque, unique string generated when the order is created.
///
/// # Constraints:
/// - **Immutable**: Once written to the ledger, NEVER changes
/// - **Unique**: Two orders never share an id (enforced on append)
pub type OrderId = String;

/// Monetary amount (unit prices, line totals, running totals).
///
/// Decimal rather than float so that running totals add and subtract exactly.
pub type Amount = Decimal;

/// Item quantity - always positive for a valid line item
pub type Quantity = u32;

//! Ledger Reader
//!
//! Loads every data row, groups rows by order id (first-seen line item
//! order preserved) and returns the orders newest-first.
//!
//! Malformed rows are skipped one by one and reported; only a file that
//! cannot be read as a table at all fails the load. An order whose rows
//! decode but whose total exceeds the decimal range is reported at its
//! first line.

use super::codec::{self, LedgerRow};
use super::file::{LedgerFile, Table};
use crate::core_types::OrderId;
use crate::error::LedgerError;
use crate::models::Order;
use serde::Serialize;
use std::collections::HashMap;

/// A data row that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// Result of a full load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Newest first
    pub orders: Vec<Order>,
    pub skipped: Vec<SkippedRow>,
}

/// Rows of a table decoded in place: `rows[i]` is `None` when `table.rows[i]` is malformed.
pub(crate) struct DecodedTable {
    pub rows: Vec<Option<LedgerRow>>,
    pub skipped: Vec<SkippedRow>,
}

impl DecodedTable {
    pub fn valid(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().flatten()
    }
}

pub(crate) fn decode_table(table: &Table) -> DecodedTable {
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut skipped = Vec::new();

    for raw in &table.rows {
        match codec::decode_bytes(&raw.record, raw.line) {
            Ok(row) => rows.push(Some(row)),
            Err(e) => {
                tracing::warn!(line = raw.line, error = %e, "Skipping malformed ledger row");
                skipped.push(SkippedRow {
                    line: raw.line,
                    reason: e.to_string(),
                });
                rows.push(None);
            }
        }
    }

    DecodedTable { rows, skipped }
}

/// Group rows into orders and sort newest-first.
///
/// Each order takes its timestamp from its first row. Orders with the same
/// timestamp come out with the later-appended one first.
pub fn group_orders(rows: impl IntoIterator<Item = LedgerRow>) -> Vec<Order> {
    let mut orders: Vec<Order> = Vec::new();
    let mut by_id: HashMap<OrderId, usize> = HashMap::new();

    for row in rows {
        match by_id.get(&row.order_id) {
            Some(&idx) => orders[idx].items.push(row.item),
            None => {
                by_id.insert(row.order_id.clone(), orders.len());
                let created_at = row.timestamp();
                orders.push(Order::with_id(row.order_id, created_at, vec![row.item]));
            }
        }
    }

    orders.reverse();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

pub struct LedgerReader<'a> {
    file: &'a LedgerFile,
}

impl<'a> LedgerReader<'a> {
    pub fn new(file: &'a LedgerFile) -> Self {
        Self { file }
    }

    /// Load all orders. A missing file is an empty ledger.
    pub fn load(&self) -> Result<LoadReport, LedgerError> {
        let Some(table) = self.file.read_table()? else {
            tracing::debug!(path = %self.file.path().display(), "No ledger file yet");
            return Ok(LoadReport::default());
        };

        let decoded = decode_table(&table);
        let (orders, out_of_range): (Vec<_>, Vec<_>) = group_orders(decoded.valid().cloned())
            .into_iter()
            .partition(|o| o.checked_total().is_some());

        let mut skipped = decoded.skipped;
        for order in out_of_range {
            let line = table
                .rows
                .iter()
                .zip(&decoded.rows)
                .find(|(_, row)| row.as_ref().is_some_and(|r| r.order_id == order.id))
                .map_or(0, |(raw, _)| raw.line);
            tracing::warn!(line, order_id = %order.id, "Skipping order with out of range total");
            skipped.push(SkippedRow {
                line,
                reason: format!("total of order {} is out of range", order.id),
            });
        }
        skipped.sort_by_key(|s| s.line);

        tracing::debug!(
            rows = table.rows.len(),
            orders = orders.len(),
            skipped = skipped.len(),
            "Loaded ledger"
        );

        Ok(LoadReport { orders, skipped })
    }
}

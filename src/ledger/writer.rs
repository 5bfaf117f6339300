//! Ledger Writer - appends completed orders
//!
//! Every line item of the appended order carries the same daily running
//! total: the sum of all order totals already recorded for that date plus
//! this order's own total.
//!
//! The append is all-or-nothing. The existing table is read, the new rows
//! are added in memory and the whole table goes through the temp-file +
//! rename protocol in [`LedgerFile::replace`].

use super::codec;
use super::daily_index::DailyIndex;
use super::file::LedgerFile;
use super::reader::decode_table;
use crate::core_types::Amount;
use crate::error::LedgerError;
use crate::models::Order;

pub struct LedgerWriter<'a> {
    file: &'a LedgerFile,
}

impl<'a> LedgerWriter<'a> {
    pub fn new(file: &'a LedgerFile) -> Self {
        Self { file }
    }

    /// Append `order` and return the running total stamped on its rows.
    pub fn append(&self, order: &Order) -> Result<Amount, LedgerError> {
        order.validate()?;

        let table = self.file.read_table()?.unwrap_or_default();
        let decoded = decode_table(&table);
        let index = DailyIndex::build(decoded.valid(), &table.rows);

        if index.contains(&order.id) {
            return Err(LedgerError::DuplicateOrder(order.id.clone()));
        }

        let prior = index.running_total(order.date())?;
        let running_total = prior.checked_add(order.total()).ok_or_else(|| {
            LedgerError::Overflow(format!(
                "running total for {} exceeds the decimal range",
                order.date()
            ))
        })?;

        let new_records: Vec<_> = order
            .items
            .iter()
            .map(|item| {
                codec::to_record(&codec::encode(order, item, running_total)).into_byte_record()
            })
            .collect();

        if !table.has_header && !table.rows.is_empty() {
            tracing::warn!(
                path = %self.file.path().display(),
                "Ledger had no header row, adding one"
            );
        }

        self.file.replace(
            table
                .rows
                .iter()
                .map(|raw| &raw.record)
                .chain(new_records.iter()),
        )?;

        tracing::info!(
            order_id = %order.id,
            date = %order.date(),
            items = order.items.len(),
            total = %order.total(),
            running_total = %running_total,
            days = index.days(),
            "Order appended to ledger"
        );

        Ok(running_total)
    }
}

//! Per-day running total index
//!
//! Rebuilt from the decoded rows every time the writer needs it. The basis
//! for a new order is the sum of every order total already recorded on that
//! date, which does not depend on rows being sorted by date.
//!
//! A day whose recorded totals exceed the decimal range has no basis; only
//! appends to that day fail.

use super::codec::LedgerRow;
use super::file::RawRow;
use crate::core_types::{Amount, OrderId};
use crate::error::LedgerError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
pub struct DailyIndex {
    // None once the day's sum overflowed
    totals: BTreeMap<NaiveDate, Option<Amount>>,
    order_ids: HashSet<OrderId>,
}

impl DailyIndex {
    /// Build from decoded rows. `raw` adds the ids of rows that failed to decode.
    pub fn build<'a>(
        decoded: impl IntoIterator<Item = &'a LedgerRow>,
        raw: &[RawRow],
    ) -> Self {
        let mut index = Self::default();
        for row in decoded {
            let total = index.totals.entry(row.date).or_insert(Some(Amount::ZERO));
            *total = total.and_then(|t| t.checked_add(row.line_total()));
            index.order_ids.insert(row.order_id.clone());
        }
        index.order_ids.extend(
            raw.iter()
                .filter_map(|r| super::codec::raw_order_id(&r.record))
                .map(str::to_string),
        );
        index
    }

    /// Running total recorded so far for `date` (zero for a new day)
    pub fn running_total(&self, date: NaiveDate) -> Result<Amount, LedgerError> {
        match self.totals.get(&date) {
            None => Ok(Amount::ZERO),
            Some(Some(total)) => Ok(*total),
            Some(None) => Err(LedgerError::Overflow(format!(
                "recorded totals for {} exceed the decimal range",
                date
            ))),
        }
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.order_ids.contains(order_id)
    }

    pub fn days(&self) -> usize {
        self.totals.len()
    }
}

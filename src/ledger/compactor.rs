//! Ledger Compactor - removes an order and rewrites the file
//!
//! # Total Correction
//!
//! Let the removed order have total `T` and recorded running total `C`.
//! Every remaining order on the same date whose recorded running total is
//! `>= C` was placed at or after it, so each of its rows drops by exactly
//! `T`. The decision is made once per order (rows are grouped by order id
//! through an index over the row arena) and the same corrected value is
//! written to each of that order's rows. Earlier same-day orders and other
//! dates are untouched.
//!
//! Rows that fail to decode are written back verbatim. So is every row when
//! the removed order's own total exceeds the decimal range: its rows go, but
//! no correction is applied.

use super::codec::{self, LedgerRow};
use super::file::LedgerFile;
use super::reader::decode_table;
use crate::core_types::Amount;
use crate::error::LedgerError;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct LedgerCompactor<'a> {
    file: &'a LedgerFile,
}

impl<'a> LedgerCompactor<'a> {
    pub fn new(file: &'a LedgerFile) -> Self {
        Self { file }
    }

    /// Remove every row of `order_id`. Returns `false` (file untouched) if none exist.
    ///
    /// `order_date` is the caller's view of the order's date. The date
    /// recorded on the removed rows wins when they disagree.
    pub fn remove(&self, order_id: &str, order_date: NaiveDate) -> Result<bool, LedgerError> {
        let Some(table) = self.file.read_table()? else {
            return Ok(false);
        };
        let mut decoded = decode_table(&table);

        let is_target = |idx: usize| -> bool {
            match &decoded.rows[idx] {
                Some(row) => row.order_id == order_id,
                None => codec::raw_order_id(&table.rows[idx].record) == Some(order_id),
            }
        };
        let targets: Vec<usize> = (0..table.rows.len()).filter(|&i| is_target(i)).collect();
        if targets.is_empty() {
            tracing::debug!(order_id, "Order not in ledger, nothing to remove");
            return Ok(false);
        }

        let removed: Vec<&LedgerRow> = targets
            .iter()
            .filter_map(|&i| decoded.rows[i].as_ref())
            .collect();
        let deleted_total = removed
            .iter()
            .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.line_total()));
        let correction = removed.first().zip(deleted_total).map(|(first, total)| {
            let cumulative = removed
                .iter()
                .map(|r| r.daily_running_total)
                .max()
                .unwrap_or(first.daily_running_total);
            (first.date, cumulative, total)
        });
        if deleted_total.is_none() {
            tracing::warn!(
                order_id,
                "Removed order total is out of range, totals left as recorded"
            );
        }

        if removed.len() < targets.len() {
            tracing::warn!(
                order_id,
                malformed = targets.len() - removed.len(),
                "Removing malformed rows of order without total correction"
            );
        }

        let mut is_removed = vec![false; table.rows.len()];
        for &i in &targets {
            is_removed[i] = true;
        }

        let corrected = match correction {
            Some((date, deleted_cumulative, deleted_total)) => {
                if date != order_date {
                    tracing::warn!(
                        order_id,
                        requested = %order_date,
                        recorded = %date,
                        "Removal date differs from recorded order date, using recorded date"
                    );
                }
                correct_totals(
                    &mut decoded.rows,
                    &is_removed,
                    date,
                    deleted_cumulative,
                    deleted_total,
                )?
            }
            None => vec![false; table.rows.len()],
        };

        let records: Vec<_> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| !is_removed[*i])
            .map(|(i, raw)| match (&decoded.rows[i], corrected[i]) {
                (Some(row), true) => codec::to_record(row).into_byte_record(),
                _ => raw.record.clone(),
            })
            .collect();

        self.file.replace(&records)?;

        tracing::info!(
            order_id,
            removed_rows = targets.len(),
            deleted_total = %deleted_total.unwrap_or_default(),
            corrected_rows = corrected.iter().filter(|c| **c).count(),
            "Order removed from ledger"
        );
        Ok(true)
    }
}

/// Subtract `deleted_total` from every later order on `date`.
///
/// Returns a per-row flag marking the rows that changed.
fn correct_totals(
    rows: &mut [Option<LedgerRow>],
    is_removed: &[bool],
    date: NaiveDate,
    deleted_cumulative: Amount,
    deleted_total: Amount,
) -> Result<Vec<bool>, LedgerError> {
    let mut changed = vec![false; rows.len()];
    if deleted_total.is_zero() {
        return Ok(changed);
    }

    // order id -> indexes of its rows in the arena
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        if let Some(row) = row
            && row.date == date
            && !is_removed[i]
        {
            groups.entry(row.order_id.as_str()).or_default().push(i);
        }
    }

    let later: Vec<usize> = groups
        .into_values()
        .filter(|idxs| {
            idxs.iter()
                .filter_map(|&i| rows[i].as_ref())
                .map(|r| r.daily_running_total)
                .max()
                .is_some_and(|cumulative| cumulative >= deleted_cumulative)
        })
        .flatten()
        .collect();

    for i in later {
        if let Some(row) = rows[i].as_mut() {
            row.daily_running_total = row
                .daily_running_total
                .checked_sub(deleted_total)
                .ok_or_else(|| {
                    LedgerError::Overflow(format!(
                        "corrected running total of order {} is out of range",
                        row.order_id
                    ))
                })?;
            changed[i] = true;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::reader::LedgerReader;
    use crate::ledger::writer::LedgerWriter;
    use crate::models::{LineItem, Order};
    use chrono::NaiveDateTime;
    use std::fs;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn dec(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn order(id: &str, at: &str, prices: &[&str]) -> Order {
        let at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap();
        let items = prices
            .iter()
            .map(|p| LineItem::new("Item", 1, dec(p)))
            .collect();
        Order::with_id(id, at, items)
    }

    fn totals(path: &std::path::Path) -> Vec<(String, Amount)> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), dec(&r[7]))
            })
            .collect()
    }

    fn seeded(orders: &[Order]) -> (TempDir, LedgerFile) {
        let dir = TempDir::new().unwrap();
        let file = LedgerFile::new(dir.path().join("orders.csv"), false);
        let writer = LedgerWriter::new(&file);
        for o in orders {
            writer.append(o).unwrap();
        }
        (dir, file)
    }

    #[test]
    fn test_remove_missing_order_leaves_bytes_identical() {
        let (_dir, file) = seeded(&[order("a", "2024-01-01 09:00:00", &["10"])]);
        let before = fs::read(file.path()).unwrap();

        let removed = LedgerCompactor::new(&file)
            .remove("nope", day("2024-01-01"))
            .unwrap();
        assert!(!removed);
        assert_eq!(fs::read(file.path()).unwrap(), before);
    }

    #[test]
    fn test_remove_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = LedgerFile::new(dir.path().join("orders.csv"), false);
        assert!(!LedgerCompactor::new(&file).remove("a", day("2024-01-01")).unwrap());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_remove_multi_item_order_corrects_each_later_order_once() {
        let (_dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["30", "20"]),
            order("c", "2024-01-01 11:00:00", &["1", "2", "3"]),
            order("d", "2024-01-02 09:00:00", &["100"]),
        ]);

        assert!(LedgerCompactor::new(&file).remove("b", day("2024-01-01")).unwrap());

        assert_eq!(
            totals(file.path()),
            vec![
                ("a".to_string(), dec("5")),
                ("c".to_string(), dec("11")),
                ("c".to_string(), dec("11")),
                ("c".to_string(), dec("11")),
                ("d".to_string(), dec("100")),
            ]
        );
    }

    #[test]
    fn test_remove_last_order_changes_nothing_else() {
        let (_dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["7"]),
        ]);
        assert!(LedgerCompactor::new(&file).remove("b", day("2024-01-01")).unwrap());
        assert_eq!(totals(file.path()), vec![("a".to_string(), dec("5"))]);
    }

    #[test]
    fn test_remove_keeps_malformed_rows_of_other_orders() {
        let (_dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["7"]),
        ]);
        let mut text = fs::read_to_string(file.path()).unwrap();
        text.push_str("z,Broken,x,1,2024-01-01,11:00:00,1,13\n");
        text.push_str("a,Broken,y,1,2024-01-01,09:00:00,1,5\n");
        fs::write(file.path(), text).unwrap();

        assert!(LedgerCompactor::new(&file).remove("a", day("2024-01-01")).unwrap());

        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("z,Broken,x,1,2024-01-01,11:00:00,1,13\n"));
        assert!(!text.contains("a,Broken"));

        let report = LedgerReader::new(&file).load().unwrap();
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_recorded_date_wins_over_caller_date() {
        let (_dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["7"]),
        ]);
        assert!(LedgerCompactor::new(&file).remove("a", day("2030-06-06")).unwrap());
        assert_eq!(totals(file.path()), vec![("b".to_string(), dec("7"))]);
    }

    #[test]
    fn test_non_utf8_rows_are_kept_or_removed_by_id() {
        let (_dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["7"]),
        ]);
        let kept: &[u8] = b"z,T\xffa,1,1,2024-01-01,11:00:00,1,13\n";
        let dropped: &[u8] = b"y,T\xffb,1,1,2024-01-01,12:00:00,1,14\n";
        let mut bytes = fs::read(file.path()).unwrap();
        bytes.extend_from_slice(kept);
        bytes.extend_from_slice(dropped);
        fs::write(file.path(), &bytes).unwrap();

        assert!(LedgerCompactor::new(&file).remove("a", day("2024-01-01")).unwrap());
        let after = fs::read(file.path()).unwrap();
        assert!(after.ends_with(&[kept, dropped].concat()));

        // Corrected b row sits before the untouched raw rows
        let b_row: &[u8] = b"b,Item,1,7,2024-01-01,10:00:00,7,7\n";
        assert!(after.windows(b_row.len()).any(|w| w == b_row));

        assert!(LedgerCompactor::new(&file).remove("y", day("2024-01-01")).unwrap());
        let after = fs::read(file.path()).unwrap();
        assert!(after.ends_with(kept));

        let report = LedgerReader::new(&file).load().unwrap();
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders[0].id, "b");
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_ledger_untouched() {
        let (dir, file) = seeded(&[
            order("a", "2024-01-01 09:00:00", &["5"]),
            order("b", "2024-01-01 10:00:00", &["7"]),
        ]);
        let before = fs::read(file.path()).unwrap();

        fs::create_dir(dir.path().join("orders.csv.tmp")).unwrap();
        let err = LedgerCompactor::new(&file)
            .remove("a", day("2024-01-01"))
            .unwrap_err();
        assert_eq!(err.code(), "FILE_ACCESS");
        assert_eq!(fs::read(file.path()).unwrap(), before);
    }
}

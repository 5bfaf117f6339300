//! Order Ledger - single tabular file of completed orders
//!
//! ```text
//! ┌──────────┐   append    ┌──────────┐
//! │  Caller  │────────────▶│  Writer  │──┐
//! │ (UI/CLI) │   load_all  ├──────────┤  │   ┌────────────┐   ┌─────────────┐
//! │          │────────────▶│  Reader  │──┼──▶│ Row Codec  │──▶│ orders.csv  │
//! │          │   remove    ├──────────┤  │   └────────────┘   └─────────────┘
//! │          │────────────▶│Compactor │──┘
//! └──────────┘             └──────────┘
//! ```
//!
//! [`Ledger`] is the handle callers hold. It serializes every operation
//! behind one mutex; nothing is cached between calls, so `load_all` after
//! `append`/`remove` always sees the file as it is now.

pub mod codec;
pub mod compactor;
pub mod daily_index;
pub mod file;
pub mod reader;
pub mod writer;

pub use codec::LedgerRow;
pub use compactor::LedgerCompactor;
pub use file::LedgerFile;
pub use reader::{LedgerReader, LoadReport, SkippedRow};
pub use writer::LedgerWriter;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::models::Order;
use crate::report::{self, DailySummary, RangeSummary};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct Ledger {
    file: Mutex<LedgerFile>,
}

impl Ledger {
    /// Open the ledger described by `config`. No I/O happens until the first operation.
    pub fn open(config: &LedgerConfig) -> Self {
        Self::at_path(config.ledger_path(), config.sync_on_write)
    }

    pub fn at_path(path: impl AsRef<Path>, sync_on_write: bool) -> Self {
        Self {
            file: Mutex::new(LedgerFile::new(path, sync_on_write)),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path().to_path_buf()
    }

    // A panic mid-operation never leaves the file half-written, so a
    // poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, LedgerFile> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a completed order.
    pub fn append(&self, order: &Order) -> Result<(), LedgerError> {
        let file = self.lock();
        LedgerWriter::new(&file).append(order).map(|_| ())
    }

    /// All orders, newest first. Malformed rows are skipped (see [`Ledger::load_report`]).
    pub fn load_all(&self) -> Result<Vec<Order>, LedgerError> {
        Ok(self.load_report()?.orders)
    }

    pub fn load_report(&self) -> Result<LoadReport, LedgerError> {
        let file = self.lock();
        LedgerReader::new(&file).load()
    }

    pub fn find(&self, order_id: &str) -> Result<Option<Order>, LedgerError> {
        Ok(self.load_all()?.into_iter().find(|o| o.id == order_id))
    }

    /// Remove an order and correct later running totals of its day.
    pub fn remove(&self, order_id: &str, order_date: NaiveDate) -> Result<bool, LedgerError> {
        let file = self.lock();
        LedgerCompactor::new(&file).remove(order_id, order_date)
    }

    /// Total and count of orders placed between `start` and `end` (inclusive)
    pub fn sum_totals_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSummary, LedgerError> {
        report::sum_totals_in_range(&self.load_all()?, start, end)
    }

    pub fn daily_summaries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>, LedgerError> {
        report::daily_summaries(&self.load_all()?, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn order(id: &str, at: &str, price: &str) -> Order {
        let at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap();
        Order::with_id(
            id,
            at,
            vec![LineItem::new("Item", 1, Decimal::from_str(price).unwrap())],
        )
    }

    #[test]
    fn test_open_uses_config_path() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
            file_name: "sales.csv".to_string(),
            sync_on_write: false,
        };
        let ledger = Ledger::open(&config);
        assert_eq!(ledger.path(), dir.path().join("sales.csv"));
    }

    #[test]
    fn test_find() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::at_path(dir.path().join("orders.csv"), false);
        ledger.append(&order("a", "2024-01-01 09:00:00", "3")).unwrap();

        assert_eq!(ledger.find("a").unwrap().unwrap().total(), Decimal::from(3i64));
        assert!(ledger.find("b").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_appends_keep_totals_consistent() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(Ledger::at_path(dir.path().join("orders.csv"), false));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let at = format!("2024-01-01 10:00:{:02}", i);
                    ledger.append(&order(&format!("o{}", i), &at, "1")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let orders = ledger.load_all().unwrap();
        assert_eq!(orders.len(), 8);

        // Running totals are 1..=8 in append order regardless of thread interleaving
        let mut rdr = csv::Reader::from_path(ledger.path()).unwrap();
        let mut totals: Vec<Decimal> = rdr
            .records()
            .map(|r| Decimal::from_str(&r.unwrap()[7]).unwrap())
            .collect();
        let appended = totals.clone();
        totals.sort();
        assert_eq!(appended, totals);
        assert_eq!(totals, (1..=8i64).map(Decimal::from).collect::<Vec<_>>());
    }
}

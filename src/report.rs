//! Date-range aggregation over loaded orders
//!
//! Pure functions over `Ledger::load_all()` output; they never touch the file.

use crate::core_types::Amount;
use crate::error::LedgerError;
use crate::models::Order;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RangeSummary {
    pub total: Amount,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total: Amount,
    pub order_count: usize,
}

impl RangeSummary {
    fn add(&mut self, order: &Order) -> Result<(), LedgerError> {
        self.total = order
            .checked_total()
            .and_then(|t| self.total.checked_add(t))
            .ok_or_else(|| {
                LedgerError::Overflow(format!("sum through order {} is out of range", order.id))
            })?;
        self.count += 1;
        Ok(())
    }
}

fn in_range(order: &Order, start: NaiveDate, end: NaiveDate) -> bool {
    (start..=end).contains(&order.date())
}

/// Sum of order totals with `start <= date <= end`. Empty when `start > end`.
pub fn sum_totals_in_range(
    orders: &[Order],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeSummary, LedgerError> {
    let mut summary = RangeSummary::default();
    for order in orders.iter().filter(|o| in_range(o, start, end)) {
        summary.add(order)?;
    }
    Ok(summary)
}

/// One entry per day that has orders, ascending by date
pub fn daily_summaries(
    orders: &[Order],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailySummary>, LedgerError> {
    let mut days: BTreeMap<NaiveDate, RangeSummary> = BTreeMap::new();
    for order in orders.iter().filter(|o| in_range(o, start, end)) {
        days.entry(order.date()).or_default().add(order)?;
    }

    Ok(days
        .into_iter()
        .map(|(date, s)| DailySummary {
            date,
            total: s.total,
            order_count: s.count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn dec(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn order(id: &str, at: &str, price: &str) -> Order {
        let at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap();
        Order::with_id(id, at, vec![LineItem::new("Item", 2, dec(price))])
    }

    fn sample() -> Vec<Order> {
        vec![
            order("d", "2024-01-03 08:00:00", "1"),
            order("c", "2024-01-02 23:59:59", "2.5"),
            order("b", "2024-01-02 00:00:00", "4"),
            order("a", "2024-01-01 12:00:00", "10"),
        ]
    }

    #[test]
    fn test_range_is_inclusive() {
        let orders = sample();
        let s = sum_totals_in_range(&orders, day("2024-01-02"), day("2024-01-03")).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.total, dec("15"));

        let all = sum_totals_in_range(&orders, day("2024-01-01"), day("2024-01-03")).unwrap();
        assert_eq!(all.count, 4);
        assert_eq!(all.total, dec("35"));
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        let orders = sample();
        assert_eq!(
            sum_totals_in_range(&orders, day("2024-02-01"), day("2024-02-28")).unwrap(),
            RangeSummary::default()
        );
        assert_eq!(
            sum_totals_in_range(&orders, day("2024-01-03"), day("2024-01-01")).unwrap(),
            RangeSummary::default()
        );
    }

    #[test]
    fn test_daily_summaries_ascending() {
        let summaries =
            daily_summaries(&sample(), day("2024-01-01"), day("2024-01-02")).unwrap();
        assert_eq!(
            summaries,
            vec![
                DailySummary {
                    date: day("2024-01-01"),
                    total: dec("20"),
                    order_count: 1
                },
                DailySummary {
                    date: day("2024-01-02"),
                    total: dec("13"),
                    order_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_sum_out_of_range_is_an_error() {
        let max = "79228162514264337593543950335";
        let orders = vec![
            order("a", "2024-01-01 09:00:00", "1"),
            order("b", "2024-01-02 09:00:00", max),
        ];
        let err = sum_totals_in_range(&orders, day("2024-01-01"), day("2024-01-31")).unwrap_err();
        assert_eq!(err.code(), "OVERFLOW");

        // Outside the range the oversized order is never summed
        let ok = sum_totals_in_range(&orders, day("2024-01-01"), day("2024-01-01")).unwrap();
        assert_eq!(ok.total, dec("2"));
        assert!(daily_summaries(&orders, day("2024-01-02"), day("2024-01-02")).is_err());
    }
}

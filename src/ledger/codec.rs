//! Ledger Row Codec
//!
//! Maps a line item (plus its parent order's id and timestamp) to one
//! fixed-column row of the ledger table, and back.
//!
//! # Column Layout
//!
//! | # | Column | Format |
//! |---|--------|--------|
//! | 0 | OrderId | opaque text |
//! | 1 | ItemName | free text (quoted by the table writer when needed) |
//! | 2 | Quantity | positive integer |
//! | 3 | UnitPrice | decimal, full scale |
//! | 4 | Date | `YYYY-MM-DD` |
//! | 5 | Time | `HH:MM:SS` (24h, local wall clock) |
//! | 6 | LineTotal | decimal, Quantity × UnitPrice |
//! | 7 | DailyRunningTotal | decimal, cumulative for the calendar day |

use crate::core_types::{Amount, OrderId, Quantity};
use crate::error::LedgerError;
use crate::models::{LineItem, Order};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ByteRecord, StringRecord};
use std::str::FromStr;

// ============================================================
// Constants
// ============================================================

pub const HEADER: [&str; 8] = [
    "OrderId",
    "ItemName",
    "Quantity",
    "UnitPrice",
    "Date",
    "Time",
    "LineTotal",
    "DailyRunningTotal",
];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

const COL_ORDER_ID: usize = 0;
const COL_ITEM_NAME: usize = 1;
const COL_QUANTITY: usize = 2;
const COL_UNIT_PRICE: usize = 3;
const COL_DATE: usize = 4;
const COL_TIME: usize = 5;
const COL_LINE_TOTAL: usize = 6;
const COL_RUNNING_TOTAL: usize = 7;

// ============================================================
// Ledger Row
// ============================================================

/// One decoded row of the ledger (one line item of one order)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub order_id: OrderId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub item: LineItem,
    pub daily_running_total: Amount,
}

impl LedgerRow {
    pub fn line_total(&self) -> Amount {
        self.item.line_total()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

// ============================================================
// Encode
// ============================================================

/// Build the row for `item` of `order`, stamped with the order's running total.
pub fn encode(order: &Order, item: &LineItem, daily_running_total: Amount) -> LedgerRow {
    LedgerRow {
        order_id: order.id.clone(),
        date: order.date(),
        time: order.time(),
        item: item.clone(),
        daily_running_total,
    }
}

pub fn header_record() -> StringRecord {
    StringRecord::from(HEADER.to_vec())
}

/// Format a row as table fields
pub fn to_record(row: &LedgerRow) -> StringRecord {
    let mut record = StringRecord::with_capacity(128, HEADER.len());
    record.push_field(&row.order_id);
    record.push_field(&row.item.name);
    record.push_field(&row.item.quantity().to_string());
    record.push_field(&row.item.unit_price().to_string());
    record.push_field(&row.date.format(DATE_FORMAT).to_string());
    record.push_field(&row.time.format(TIME_FORMAT).to_string());
    record.push_field(&row.line_total().to_string());
    record.push_field(&row.daily_running_total.to_string());
    record
}

// ============================================================
// Decode
// ============================================================

pub fn is_header(record: &ByteRecord) -> bool {
    record.len() == HEADER.len()
        && record
            .iter()
            .zip(HEADER.iter())
            .all(|(field, name)| field.trim_ascii() == name.as_bytes())
}

/// Decode a raw record as read from the file. Invalid UTF-8 is a malformed row.
pub fn decode_bytes(record: &ByteRecord, line: u64) -> Result<LedgerRow, LedgerError> {
    let record = StringRecord::from_byte_record(record.clone()).map_err(|e| {
        LedgerError::malformed(line, format!("row is not valid UTF-8: {}", e))
    })?;
    decode(&record, line)
}

/// Parse a table record. `line` is only used for error reporting.
pub fn decode(record: &StringRecord, line: u64) -> Result<LedgerRow, LedgerError> {
    if record.len() != HEADER.len() {
        return Err(LedgerError::malformed(
            line,
            format!("expected {} columns, found {}", HEADER.len(), record.len()),
        ));
    }

    let order_id = record[COL_ORDER_ID].trim();
    if order_id.is_empty() {
        return Err(LedgerError::malformed(line, "OrderId is empty"));
    }

    let quantity: Quantity = record[COL_QUANTITY].trim().parse().map_err(|_| {
        LedgerError::malformed(
            line,
            format!("Quantity '{}' is not an integer", &record[COL_QUANTITY]),
        )
    })?;
    let unit_price = parse_amount(record, COL_UNIT_PRICE, line)?;

    let date = NaiveDate::parse_from_str(record[COL_DATE].trim(), DATE_FORMAT).map_err(|e| {
        LedgerError::malformed(line, format!("Date '{}': {}", &record[COL_DATE], e))
    })?;
    let time = NaiveTime::parse_from_str(record[COL_TIME].trim(), TIME_FORMAT).map_err(|e| {
        LedgerError::malformed(line, format!("Time '{}': {}", &record[COL_TIME], e))
    })?;

    let line_total = parse_amount(record, COL_LINE_TOTAL, line)?;
    let daily_running_total = parse_amount(record, COL_RUNNING_TOTAL, line)?;

    let item = LineItem::new(&record[COL_ITEM_NAME], quantity, unit_price);
    let Some(expected) = item.checked_line_total() else {
        return Err(LedgerError::malformed(line, "LineTotal overflows"));
    };
    if expected != line_total {
        return Err(LedgerError::malformed(
            line,
            format!(
                "LineTotal {} does not match {} x {}",
                line_total, quantity, unit_price
            ),
        ));
    }

    Ok(LedgerRow {
        order_id: order_id.to_string(),
        date,
        time,
        item,
        daily_running_total,
    })
}

/// Order id of a record without decoding the rest of it
pub fn raw_order_id(record: &ByteRecord) -> Option<&str> {
    record
        .get(COL_ORDER_ID)
        .and_then(|field| std::str::from_utf8(field).ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn parse_amount(record: &StringRecord, col: usize, line: u64) -> Result<Amount, LedgerError> {
    Amount::from_str(record[col].trim()).map_err(|_| {
        LedgerError::malformed(
            line,
            format!("{} '{}' is not a number", HEADER[col], &record[col]),
        )
    })
}

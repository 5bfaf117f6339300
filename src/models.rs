// models.rs - Core order and line item types

use crate::core_types::{Amount, OrderId, Quantity};
use crate::error::LedgerError;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

// ============================================================
// LINE ITEM
// ============================================================

/// One priced quantity of a named product within an order.
///
/// The line total is never stored: it is `quantity * unit_price` every time
/// it is asked for, so changing either field keeps it consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    quantity: Quantity,
    unit_price: Amount,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: Quantity, unit_price: Amount) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }

    pub fn set_unit_price(&mut self, unit_price: Amount) {
        self.unit_price = unit_price;
    }

    /// quantity × unit price
    ///
    /// Only for items already known to fit: validated orders and decoded rows.
    pub fn line_total(&self) -> Amount {
        Amount::from(self.quantity) * self.unit_price
    }

    /// `None` when quantity × unit price exceeds the decimal range
    pub fn checked_line_total(&self) -> Option<Amount> {
        Amount::from(self.quantity).checked_mul(self.unit_price)
    }
}

// ============================================================
// ORDER
// ============================================================

/// A completed order: id, placement timestamp (second precision) and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: NaiveDateTime,
    pub items: Vec<LineItem>,
}

impl Order {
    /// Create a new order stamped with the local wall clock.
    pub fn new(items: Vec<LineItem>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self::with_id(id, Local::now().naive_local(), items)
    }

    /// Create an order with an explicit id and timestamp.
    ///
    /// Sub-second precision is dropped: the ledger stores `HH:MM:SS`.
    pub fn with_id(
        id: impl Into<OrderId>,
        created_at: NaiveDateTime,
        items: Vec<LineItem>,
    ) -> Self {
        let created_at = created_at.with_nanosecond(0).unwrap_or(created_at);
        Self {
            id: id.into(),
            created_at,
            items,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.created_at.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.created_at.time()
    }

    /// Sum of line totals
    pub fn total(&self) -> Amount {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn checked_total(&self) -> Option<Amount> {
        self.items.iter().try_fold(Amount::ZERO, |acc, item| {
            acc.checked_add(item.checked_line_total()?)
        })
    }

    /// Check the order can be written to the ledger.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::InvalidOrder("order id is empty".to_string()));
        }
        if self.id.trim() != self.id {
            return Err(LedgerError::InvalidOrder(format!(
                "order id '{}' has leading or trailing whitespace",
                self.id
            )));
        }
        if self.items.is_empty() {
            return Err(LedgerError::InvalidOrder(format!(
                "order {} has no line items",
                self.id
            )));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(LedgerError::InvalidOrder(format!(
                    "order {} item #{} has no name",
                    self.id, idx
                )));
            }
            if item.quantity == 0 {
                return Err(LedgerError::InvalidOrder(format!(
                    "order {} item '{}' has zero quantity",
                    self.id, item.name
                )));
            }
            if item.unit_price < Amount::ZERO {
                return Err(LedgerError::InvalidOrder(format!(
                    "order {} item '{}' has negative unit price {}",
                    self.id, item.name, item.unit_price
                )));
            }
        }
        if self.checked_total().is_none() {
            return Err(LedgerError::InvalidOrder(format!(
                "order {} total is out of range",
                self.id
            )));
        }
        Ok(())
    }
}

//! Ledger Error Types
//!
//! One taxonomy for every ledger operation. Row-level failures
//! (`MalformedRow`) are recovered inside the reader; everything else is
//! surfaced to the caller of the failing operation and never retried.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    // === File Errors ===
    #[error("Cannot access ledger file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write ledger file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Ledger file {path} is unreadable: {reason}")]
    Load { path: PathBuf, reason: String },

    // === Row Errors ===
    #[error("Malformed ledger row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    // === Order Errors ===
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order already recorded: {0}")]
    DuplicateOrder(String),

    // === Arithmetic ===
    #[error("Amount out of range: {0}")]
    Overflow(String),
}

impl LedgerError {
    /// Stable code for callers that map errors to user-facing messages
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::FileAccess { .. } => "FILE_ACCESS",
            LedgerError::Write { .. } => "WRITE",
            LedgerError::Load { .. } => "LOAD",
            LedgerError::MalformedRow { .. } => "MALFORMED_ROW",
            LedgerError::InvalidOrder(_) => "INVALID_ORDER",
            LedgerError::DuplicateOrder(_) => "DUPLICATE_ORDER",
            LedgerError::Overflow(_) => "OVERFLOW",
        }
    }

    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
        LedgerError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}

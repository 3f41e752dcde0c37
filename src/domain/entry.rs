use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a ledger row books a purchase from the supplier or a payment to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Purchase,
    Payment,
}

/// A single row from a Tally/Busy supplier ledger export.
/// Entries are immutable once produced by the parser; matching works on
/// separate mutable queue items, never on the entries themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub entry_type: EntryType,
    pub supplier: String,
    /// Always positive: the parser drops rows without a positive debit or credit.
    pub amount: Decimal,
}

impl LedgerEntry {
    pub fn new(
        date: NaiveDate,
        entry_type: EntryType,
        supplier: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            date,
            entry_type,
            supplier: supplier.into(),
            amount,
        }
    }
}

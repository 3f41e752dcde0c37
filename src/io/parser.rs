use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use rust_decimal::Decimal;
use thiserror::Error;

use super::cell::CellValue;
use crate::domain::{EntryType, LedgerEntry};

/// Why a ledger file could not be turned into entries. Per-file: the upload
/// orchestrator collects these instead of failing the batch.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Could not read workbook: {0}")]
    UnreadableWorkbook(String),

    #[error("Spreadsheet is empty")]
    EmptySheet,

    #[error("Spreadsheet has no header row")]
    MissingHeaderRow,

    #[error("Could not find Date column. Found headers: {}", .headers.join(", "))]
    MissingDateColumn { headers: Vec<String> },

    #[error("Could not find Debit or Credit columns. Found headers: {}", .headers.join(", "))]
    MissingAmountColumns { headers: Vec<String> },

    #[error("No valid entries found. Check that the Date, Debit and Credit columns hold usable data")]
    NoValidRows,
}

/// Turns raw tabular bytes into ordered ledger entries. A trait so further
/// input formats can be plugged in without touching the orchestrator.
pub trait LedgerParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<Vec<LedgerEntry>, ParseError>;
}

/// Parser for Tally/Busy-style workbook exports (first worksheet only).
///
/// Columns are located by fuzzy header match: date (`date`), debit
/// (`debit`/`dr`), credit (`credit`/`cr`), supplier
/// (`supplier`/`party`/`ledger`/`name`). A sheet with exactly four columns
/// and no credit header is read positionally as [Date, Debit, Credit,
/// Supplier] instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelLedgerParser;

/// Resolved column positions for row interpretation.
struct Columns {
    date: usize,
    debit: Option<usize>,
    credit: Option<usize>,
    supplier: Option<usize>,
}

impl LedgerParser for ExcelLedgerParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<Vec<LedgerEntry>, ParseError> {
        let default_supplier = file_stem(filename);

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ParseError::UnreadableWorkbook(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ParseError::EmptySheet)?
            .map_err(|e| ParseError::UnreadableWorkbook(e.to_string()))?;
        if range.is_empty() {
            return Err(ParseError::EmptySheet);
        }

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ParseError::MissingHeaderRow)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|c| CellValue::from(c).as_text())
            .collect();
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();

        let date_idx = normalized.iter().position(|h| h.contains("date"));
        let debit_idx = normalized
            .iter()
            .position(|h| h.contains("debit") || h.contains("dr"));
        let credit_idx = normalized
            .iter()
            .position(|h| h.contains("credit") || h.contains("cr"));
        let supplier_idx = normalized.iter().position(|h| {
            h.contains("supplier") || h.contains("party") || h.contains("ledger") || h.contains("name")
        });

        // A 4-column sheet without any credit-like header is taken to be the
        // fixed Tally layout, headers notwithstanding.
        let columns = if range.width() == 4 && credit_idx.is_none() {
            tracing::debug!(filename, "no credit header in 4-column sheet, using positional columns");
            Columns {
                date: 0,
                debit: Some(1),
                credit: Some(2),
                supplier: Some(3),
            }
        } else {
            let date = date_idx.ok_or_else(|| ParseError::MissingDateColumn {
                headers: headers.clone(),
            })?;
            if debit_idx.is_none() && credit_idx.is_none() {
                return Err(ParseError::MissingAmountColumns { headers });
            }
            Columns {
                date,
                debit: debit_idx,
                credit: credit_idx,
                supplier: supplier_idx,
            }
        };

        let entries: Vec<LedgerEntry> = rows
            .filter_map(|row| interpret_row(row, &columns, &default_supplier))
            .collect();
        if entries.is_empty() {
            return Err(ParseError::NoValidRows);
        }
        Ok(entries)
    }
}

/// One data row to at most one entry. Rows without a parseable date or a
/// positive debit/credit are skipped, not errors.
fn interpret_row(row: &[Data], columns: &Columns, default_supplier: &str) -> Option<LedgerEntry> {
    let date = cell_at(row, columns.date).as_date()?;

    let debit = columns
        .debit
        .map(|i| cell_at(row, i).as_decimal())
        .unwrap_or(Decimal::ZERO);
    let credit = columns
        .credit
        .map(|i| cell_at(row, i).as_decimal())
        .unwrap_or(Decimal::ZERO);
    if debit <= Decimal::ZERO && credit <= Decimal::ZERO {
        return None;
    }

    let supplier_cell = columns
        .supplier
        .map(|i| cell_at(row, i).as_text())
        .unwrap_or_default();
    let supplier = match supplier_cell.trim() {
        "" => default_supplier,
        s => s,
    };

    // Debit = money going out to the supplier (a payment); credit = a
    // purchase booked against them.
    let (entry_type, amount) = if debit > Decimal::ZERO {
        (EntryType::Payment, debit)
    } else {
        (EntryType::Purchase, credit)
    };
    Some(LedgerEntry::new(date, entry_type, supplier, amount))
}

fn cell_at(row: &[Data], index: usize) -> CellValue {
    row.get(index).map(CellValue::from).unwrap_or(CellValue::Empty)
}

/// Lowercase and strip everything that is not a letter, so "Txn. Date" and
/// "TXN DATE" both match.
fn normalize_column_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Filename without its trailing extension; "Unknown" when there is no name.
pub fn file_stem(filename: &str) -> String {
    if filename.is_empty() {
        return "Unknown".to_string();
    }
    match filename.rfind('.') {
        Some(dot) if dot > 0 => filename[..dot].to_string(),
        _ => filename.to_string(),
    }
}

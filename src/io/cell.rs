use calamine::Data;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::domain::parse_amount;

/// Spreadsheet dates are serial day counts from this base (the 1900 epoch
/// with the Lotus leap-year quirk already folded in).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial worth interpreting as a date (9999-12-31).
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// A spreadsheet cell reduced to the shapes the ledger pipeline cares about.
/// One coercion function per target type keeps the format heuristics in a
/// single testable place instead of scattered over the parsing loops.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ndt) => CellValue::Date(ndt.date()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

impl CellValue {
    /// Coerce to a calendar date: native date cells, Excel serial numbers
    /// and ISO-8601 strings (date or datetime). None when unparseable.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Number(n) => from_excel_serial(*n),
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                // Full ISO date, or the date part of an ISO datetime.
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .or_else(|| s.get(..10).and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok()))
            }
            _ => None,
        }
    }

    /// Coerce to an amount, permissively; zero when the cell holds nothing
    /// numeric at all.
    pub fn as_decimal(&self) -> Decimal {
        match self {
            CellValue::Number(n) => Decimal::from_f64(*n).unwrap_or(Decimal::ZERO),
            CellValue::Text(s) => parse_amount(s),
            _ => Decimal::ZERO,
        }
    }

    /// Coerce to display text (used for headers and supplier names).
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_as_date_from_iso_text() {
        assert_eq!(CellValue::Text("2023-01-01".into()).as_date(), Some(date("2023-01-01")));
        assert_eq!(
            CellValue::Text("2023-01-01T00:00:00".into()).as_date(),
            Some(date("2023-01-01"))
        );
        assert_eq!(CellValue::Text("  2023-02-28 ".into()).as_date(), Some(date("2023-02-28")));
        assert_eq!(CellValue::Text("31/01/2023".into()).as_date(), None);
        assert_eq!(CellValue::Text("".into()).as_date(), None);
    }

    #[test]
    fn test_as_date_from_excel_serial() {
        assert_eq!(CellValue::Number(44927.0).as_date(), Some(date("2023-01-01")));
        // Time-of-day fraction is dropped.
        assert_eq!(CellValue::Number(44927.75).as_date(), Some(date("2023-01-01")));
        assert_eq!(CellValue::Number(0.0).as_date(), None);
        assert_eq!(CellValue::Number(-5.0).as_date(), None);
    }

    #[test]
    fn test_as_date_from_other_shapes() {
        assert_eq!(CellValue::Date(date("2023-03-15")).as_date(), Some(date("2023-03-15")));
        assert_eq!(CellValue::Bool(true).as_date(), None);
        assert_eq!(CellValue::Empty.as_date(), None);
    }

    #[test]
    fn test_as_decimal() {
        assert_eq!(CellValue::Number(100000.0).as_decimal(), dec!(100000));
        assert_eq!(CellValue::Number(1234.56).as_decimal(), dec!(1234.56));
        assert_eq!(CellValue::Text("1,00,000.50".into()).as_decimal(), dec!(100000.50));
        assert_eq!(CellValue::Text("n/a".into()).as_decimal(), Decimal::ZERO);
        assert_eq!(CellValue::Empty.as_decimal(), Decimal::ZERO);
        assert_eq!(CellValue::Bool(true).as_decimal(), Decimal::ZERO);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Text("Acme Traders".into()).as_text(), "Acme Traders");
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(42.5).as_text(), "42.5");
        assert_eq!(CellValue::Date(date("2023-01-01")).as_text(), "2023-01-01");
        assert_eq!(CellValue::Empty.as_text(), "");
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use thiserror::Error;

use crate::domain::{CalculationSummary, InterestStatus, LedgerResult, format_amount};

const MAX_SHEET_NAME_LEN: usize = 31;
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Workbook generation failure. Fatal for the export request, never retried.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to generate workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// Renders calculation results into a downloadable document. A trait so
/// further output formats can be plugged in without touching the service.
pub trait ExportStrategy {
    fn generate(&self, results: &[LedgerResult], filename: &str) -> Result<Vec<u8>, ExportError>;
    fn content_type(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
}

/// Workbook export: a Summary sheet with per-ledger totals and a grand
/// total, then one detail sheet per ledger.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelExportStrategy;

impl ExportStrategy for ExcelExportStrategy {
    fn generate(&self, results: &[LedgerResult], _filename: &str) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();

        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        summary.write_string(0, 0, "Ledger Name")?;
        summary.write_string(0, 1, "Total ITC Reversal")?;
        summary.write_string(0, 2, "Total Interest")?;

        let mut row = 1u32;
        for result in results {
            summary.write_string(row, 0, result.ledger_name.as_str())?;
            summary.write_string(row, 1, format_amount(result.summary.total_itc_reversal))?;
            summary.write_string(row, 2, format_amount(result.summary.total_interest))?;
            row += 1;
        }

        let grand_itc: Decimal = results.iter().map(|r| r.summary.total_itc_reversal).sum();
        let grand_interest: Decimal = results.iter().map(|r| r.summary.total_interest).sum();
        row += 1; // blank separator row
        summary.write_string(row, 0, "GRAND TOTAL")?;
        summary.write_string(row, 1, format_amount(grand_itc))?;
        summary.write_string(row, 2, format_amount(grand_interest))?;

        summary.set_column_width(0, 40)?;
        summary.set_column_width(1, 20)?;
        summary.set_column_width(2, 20)?;

        for result in results {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sanitize_sheet_name(&result.ledger_name))?;
            write_ledger_sheet(sheet, &result.summary)?;
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn content_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }
}

fn write_ledger_sheet(sheet: &mut Worksheet, summary: &CalculationSummary) -> Result<(), XlsxError> {
    sheet.write_string(0, 0, "Supplier")?;
    sheet.write_string(0, 1, "Purchase Date")?;
    sheet.write_string(0, 2, "Payment Date")?;
    sheet.write_string(0, 3, "Principal Amount")?;
    sheet.write_string(0, 4, "Delay Days")?;
    sheet.write_string(0, 5, "ITC Amount (18%)")?;
    sheet.write_string(0, 6, "Interest (18% p.a.)")?;
    sheet.write_string(0, 7, "Status")?;

    let mut row = 1u32;
    for detail in &summary.details {
        sheet.write_string(row, 0, detail.supplier.as_str())?;
        sheet.write_string(row, 1, format_date(detail.purchase_date))?;
        let payment = match detail.payment_date {
            Some(date) => format_date(date),
            None => "Unpaid".to_string(),
        };
        sheet.write_string(row, 2, payment)?;
        sheet.write_string(row, 3, format_amount(detail.principal))?;
        sheet.write_number(row, 4, detail.delay_days as f64)?;
        sheet.write_string(row, 5, format_amount(detail.itc_amount))?;
        sheet.write_string(row, 6, format_amount(detail.interest))?;
        let status = match detail.status {
            InterestStatus::PaidLate => "Paid Late",
            InterestStatus::Unpaid => "Unpaid",
        };
        sheet.write_string(row, 7, status)?;
        row += 1;
    }

    row += 1; // blank separator row
    sheet.write_string(row, 0, "TOTAL")?;
    sheet.write_string(row, 5, format_amount(summary.total_itc_reversal))?;
    sheet.write_string(row, 6, format_amount(summary.total_interest))?;

    sheet.set_column_width(0, 30)?;
    sheet.set_column_width(1, 15)?;
    sheet.set_column_width(2, 15)?;
    sheet.set_column_width(3, 18)?;
    sheet.set_column_width(4, 12)?;
    sheet.set_column_width(5, 18)?;
    sheet.set_column_width(6, 20)?;
    sheet.set_column_width(7, 12)?;

    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Worksheet names must avoid `: \ / ? * [ ]` and fit in 31 characters.
fn sanitize_sheet_name(name: &str) -> String {
    if name.is_empty() {
        return "Sheet".to_string();
    }
    name.chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

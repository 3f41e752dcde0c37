// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use rule37::application::{Rule37Service, UploadContext, UploadFile};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(Rule37Service, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = Rule37Service::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Upload context for the default test tenant
pub fn test_context() -> UploadContext {
    UploadContext {
        tenant_id: "default".to_string(),
        created_by: Some("tester".to_string()),
    }
}

/// A ledger row for workbook fixtures: (date, debit, credit, supplier)
pub struct FixtureRow(pub &'static str, pub f64, pub f64, pub &'static str);

/// Build an in-memory ledger workbook with the standard Tally-style headers
pub fn ledger_workbook(rows: &[FixtureRow]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Date").unwrap();
    sheet.write_string(0, 1, "Debit").unwrap();
    sheet.write_string(0, 2, "Credit").unwrap();
    sheet.write_string(0, 3, "Supplier").unwrap();
    for (i, FixtureRow(date, debit, credit, supplier)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *date).unwrap();
        sheet.write_number(r, 1, *debit).unwrap();
        sheet.write_number(r, 2, *credit).unwrap();
        sheet.write_string(r, 3, *supplier).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Wrap workbook bytes as an upload batch entry
pub fn upload_file(filename: &str, bytes: Vec<u8>) -> UploadFile {
    UploadFile {
        filename: filename.to_string(),
        bytes,
    }
}

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    CalculationRun, CalculationSummary, InterestRow, InterestStatus, LedgerResult, RunId,
};
use crate::storage::Repository;

use super::{AppError, LedgerFileProcessor, UploadConfig};

/// One file of an upload batch, fully buffered the way a multipart upload
/// arrives. Only the parsed form is bounded to one file at a time.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Caller identity for an upload, passed explicitly instead of read from
/// ambient state.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub tenant_id: String,
    pub created_by: Option<String>,
}

/// Outcome of an upload batch: results for every file that parsed, collected
/// errors for every file that did not. Partial success is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub run_id: RunId,
    pub filename: String,
    pub results: Vec<LedgerResultDto>,
    pub errors: Vec<FileUploadError>,
}

impl UploadResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadError {
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResultDto {
    pub ledger_name: String,
    pub summary: CalculationSummaryDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationSummaryDto {
    pub total_interest: Decimal,
    pub total_itc_reversal: Decimal,
    pub details: Vec<InterestRowDto>,
}

/// Wire rendering of an interest row: dates as ISO strings, the literal
/// "Unpaid" for a missing payment date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRowDto {
    pub supplier: String,
    pub purchase_date: String,
    pub payment_date: String,
    pub principal: Decimal,
    pub delay_days: i64,
    pub itc_amount: Decimal,
    pub interest: Decimal,
    pub status: String,
}

/// Drives one upload batch: validates it, processes the files strictly
/// sequentially with per-file failure isolation, rolls up grand totals and
/// stores the run.
pub struct UploadOrchestrator<'a> {
    processor: LedgerFileProcessor,
    repo: &'a Repository,
    config: &'a UploadConfig,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(repo: &'a Repository, config: &'a UploadConfig) -> Self {
        Self {
            processor: LedgerFileProcessor::new(),
            repo,
            config,
        }
    }

    pub async fn process_upload(
        &self,
        files: Vec<UploadFile>,
        as_on_date: NaiveDate,
        ctx: &UploadContext,
    ) -> Result<UploadResult, AppError> {
        self.validate_batch(&files)?;

        let mut results: Vec<LedgerResult> = Vec::new();
        let mut errors: Vec<FileUploadError> = Vec::new();

        for file in &files {
            if file.bytes.is_empty() {
                errors.push(FileUploadError {
                    filename: file.filename.clone(),
                    message: "File is empty".to_string(),
                });
                continue;
            }
            if file.bytes.len() > self.config.max_file_size_bytes {
                errors.push(FileUploadError {
                    filename: file.filename.clone(),
                    message: format!(
                        "File exceeds max size {} bytes",
                        self.config.max_file_size_bytes
                    ),
                });
                continue;
            }

            match self.processor.process(&file.bytes, &file.filename, as_on_date) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(filename = %file.filename, error = %e, "ledger file rejected");
                    errors.push(FileUploadError {
                        filename: file.filename.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if results.is_empty() {
            let combined = errors
                .iter()
                .map(|e| format!("{}: {}", e.filename, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::AllFilesFailed(combined));
        }

        let total_interest: Decimal = results.iter().map(|r| r.summary.total_interest).sum();
        let total_itc_reversal: Decimal =
            results.iter().map(|r| r.summary.total_itc_reversal).sum();

        let now = Utc::now();
        let filename = if results.len() == 1 {
            results[0].ledger_name.clone()
        } else {
            format!("{} files - {}", results.len(), as_on_date)
        };

        let run = CalculationRun {
            id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id.clone(),
            filename,
            as_on_date,
            total_interest,
            total_itc_reversal,
            calculation_data: results.clone(),
            created_at: now,
            created_by: ctx.created_by.clone(),
            expires_at: now + Duration::days(self.config.retention_days),
        };
        self.repo.save_run(&run).await?;
        tracing::info!(run_id = %run.id, files = results.len(), "calculation run stored");

        Ok(UploadResult {
            run_id: run.id,
            filename: run.filename,
            results: results.iter().map(to_result_dto).collect(),
            errors,
        })
    }

    /// Whole-batch validation, rejected before any file is parsed.
    fn validate_batch(&self, files: &[UploadFile]) -> Result<(), AppError> {
        if files.is_empty() {
            return Err(AppError::EmptyBatch);
        }
        if files.len() > self.config.max_files {
            return Err(AppError::TooManyFiles(self.config.max_files));
        }
        Ok(())
    }
}

fn to_result_dto(result: &LedgerResult) -> LedgerResultDto {
    LedgerResultDto {
        ledger_name: result.ledger_name.clone(),
        summary: to_summary_dto(&result.summary),
    }
}

fn to_summary_dto(summary: &CalculationSummary) -> CalculationSummaryDto {
    CalculationSummaryDto {
        total_interest: summary.total_interest,
        total_itc_reversal: summary.total_itc_reversal,
        details: summary.details.iter().map(to_row_dto).collect(),
    }
}

fn to_row_dto(row: &InterestRow) -> InterestRowDto {
    InterestRowDto {
        supplier: row.supplier.clone(),
        purchase_date: row.purchase_date.to_string(),
        payment_date: row
            .payment_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unpaid".to_string()),
        principal: row.principal,
        delay_days: row.delay_days,
        itc_amount: row.itc_amount,
        interest: row.interest,
        status: match row.status {
            InterestStatus::PaidLate => "PAID_LATE",
            InterestStatus::Unpaid => "UNPAID",
        }
        .to_string(),
    }
}

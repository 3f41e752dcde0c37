use thiserror::Error;

use crate::domain::RunId;
use crate::io::ExportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No files provided")]
    EmptyBatch,

    #[error("Too many files. Max: {0}")]
    TooManyFiles(usize),

    #[error("All files failed. {0}")]
    AllFilesFailed(String),

    #[error("Calculation run not found: {0}")]
    RunNotFound(RunId),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

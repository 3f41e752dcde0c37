use chrono::NaiveDate;

use crate::domain::{CalculationRun, RunId};
use crate::io::ExportStrategy;
use crate::storage::Repository;

use super::{AppError, UploadConfig, UploadContext, UploadFile, UploadOrchestrator, UploadResult};

/// Application service providing high-level operations for calculation runs.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct Rule37Service {
    repo: Repository,
    config: UploadConfig,
}

/// A generated export, ready to hand to the caller as a download.
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Rule37Service {
    /// Create a new service with the given repository and limits.
    pub fn new(repo: Repository, config: UploadConfig) -> Self {
        Self { repo, config }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, UploadConfig::default()))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, UploadConfig::default()))
    }

    pub fn with_config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    /// Process an upload batch end to end and store the resulting run.
    pub async fn upload(
        &self,
        files: Vec<UploadFile>,
        as_on_date: NaiveDate,
        ctx: &UploadContext,
    ) -> Result<UploadResult, AppError> {
        UploadOrchestrator::new(&self.repo, &self.config)
            .process_upload(files, as_on_date, ctx)
            .await
    }

    /// List stored runs for a tenant, newest first.
    pub async fn list_runs(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CalculationRun>, AppError> {
        Ok(self.repo.list_runs(tenant_id, limit, offset).await?)
    }

    /// Get a stored run by id.
    pub async fn get_run(&self, id: RunId, tenant_id: &str) -> Result<CalculationRun, AppError> {
        self.repo
            .get_run(id, tenant_id)
            .await?
            .ok_or(AppError::RunNotFound(id))
    }

    /// Delete a stored run.
    pub async fn delete_run(&self, id: RunId, tenant_id: &str) -> Result<(), AppError> {
        if !self.repo.delete_run(id, tenant_id).await? {
            return Err(AppError::RunNotFound(id));
        }
        tracing::info!(run_id = %id, "calculation run deleted");
        Ok(())
    }

    /// Re-export a stored run through the given strategy.
    pub async fn export_run(
        &self,
        id: RunId,
        tenant_id: &str,
        strategy: &dyn ExportStrategy,
    ) -> Result<ExportFile, AppError> {
        let run = self.get_run(id, tenant_id).await?;
        let bytes = strategy.generate(&run.calculation_data, &run.filename)?;
        Ok(ExportFile {
            filename: format!(
                "{}_Interest_Calculation.{}",
                run.filename,
                strategy.file_extension()
            ),
            content_type: strategy.content_type(),
            bytes,
        })
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{CalculationRun, RunId};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying calculation runs.
/// Runs are append-only: saved once, read by id/tenant, deleted explicitly.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Save a new calculation run.
    pub async fn save_run(&self, run: &CalculationRun) -> Result<()> {
        let calculation_data = serde_json::to_string(&run.calculation_data)
            .context("Failed to serialize calculation data")?;

        sqlx::query(
            r#"
            INSERT INTO calculation_runs (id, tenant_id, filename, as_on_date, total_interest, total_itc_reversal, calculation_data, created_at, created_by, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.id.to_string())
        .bind(&run.tenant_id)
        .bind(&run.filename)
        .bind(run.as_on_date.to_string())
        .bind(run.total_interest.to_string())
        .bind(run.total_itc_reversal.to_string())
        .bind(&calculation_data)
        .bind(run.created_at.to_rfc3339())
        .bind(&run.created_by)
        .bind(run.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save calculation run")?;

        Ok(())
    }

    /// Get a run by id, scoped to a tenant.
    pub async fn get_run(&self, id: RunId, tenant_id: &str) -> Result<Option<CalculationRun>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, filename, as_on_date, total_interest, total_itc_reversal, calculation_data, created_at, created_by, expires_at
            FROM calculation_runs
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch calculation run")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_run(&row)?)),
            None => Ok(None),
        }
    }

    /// List a tenant's runs, newest first.
    pub async fn list_runs(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CalculationRun>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, filename, as_on_date, total_interest, total_itc_reversal, calculation_data, created_at, created_by, expires_at
            FROM calculation_runs
            WHERE tenant_id = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list calculation runs")?;

        rows.iter().map(Self::row_to_run).collect()
    }

    /// Delete a run, scoped to a tenant. Returns false when nothing matched.
    pub async fn delete_run(&self, id: RunId, tenant_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM calculation_runs WHERE id = ? AND tenant_id = ?")
            .bind(id.to_string())
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete calculation run")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> Result<CalculationRun> {
        let id_str: String = row.get("id");
        let as_on_date_str: String = row.get("as_on_date");
        let total_interest_str: String = row.get("total_interest");
        let total_itc_reversal_str: String = row.get("total_itc_reversal");
        let calculation_data_str: String = row.get("calculation_data");
        let created_at_str: String = row.get("created_at");
        let expires_at_str: String = row.get("expires_at");

        Ok(CalculationRun {
            id: Uuid::parse_str(&id_str).context("Invalid run ID")?,
            tenant_id: row.get("tenant_id"),
            filename: row.get("filename"),
            as_on_date: NaiveDate::parse_from_str(&as_on_date_str, "%Y-%m-%d")
                .context("Invalid as_on_date")?,
            total_interest: total_interest_str
                .parse::<Decimal>()
                .context("Invalid total_interest")?,
            total_itc_reversal: total_itc_reversal_str
                .parse::<Decimal>()
                .context("Invalid total_itc_reversal")?,
            calculation_data: serde_json::from_str(&calculation_data_str)
                .context("Invalid calculation data")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            created_by: row.get("created_by"),
            expires_at: DateTime::parse_from_rfc3339(&expires_at_str)
                .context("Invalid expires_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

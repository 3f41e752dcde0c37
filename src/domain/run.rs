use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LedgerResult;

pub type RunId = Uuid;

/// A persisted calculation run: one per successful upload batch.
/// Runs are immutable - a recalculation is a new run, never an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRun {
    pub id: RunId,
    pub tenant_id: String,
    /// Single ledger name, or "<n> files - <as-on-date>" for multi-file runs.
    pub filename: String,
    pub as_on_date: NaiveDate,
    pub total_interest: Decimal,
    pub total_itc_reversal: Decimal,
    /// Full per-ledger results, stored as a JSON column.
    pub calculation_data: Vec<LedgerResult>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    /// Retention horizon; sweeping expired runs is the host's concern.
    pub expires_at: DateTime<Utc>,
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::ledger_row::{
    EarlyDepartureRow, GenericRow, LatenessRow, LeaveRow, LedgerRow, ReviewFields,
};
use crate::model::request::{Decision, RequestStatus};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// A persisted collection of rows for one category of employee event.
#[async_trait]
pub trait Ledger: Send + Sync {
    type Row: LedgerRow;

    async fn list_by_owner(&self, owner: u64) -> Result<Vec<Self::Row>, sqlx::Error>;

    async fn list_all(&self) -> Result<Vec<Self::Row>, sqlx::Error>;

    /// Applies the audit write to the row with `id`.
    /// Returns `None` when this ledger has no such row.
    async fn update_status(
        &self,
        id: &str,
        write: &StatusWrite,
    ) -> Result<Option<Self::Row>, sqlx::Error>;

    async fn insert(&self, row: &Self::Row) -> Result<(), sqlx::Error>;
}

/// The audit fields written by a review decision.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusWrite {
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    pub rejected_by: Option<u64>,
    pub reviewed_at: DateTime<Utc>,
    pub reject_reason: Option<String>,
}

impl StatusWrite {
    pub fn decide(
        decision: Decision,
        reviewer: u64,
        reject_reason: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        match decision {
            Decision::Approved => Self {
                status: RequestStatus::Approved,
                approved_by: Some(reviewer),
                rejected_by: None,
                reviewed_at,
                reject_reason: None,
            },
            Decision::Rejected => Self {
                status: RequestStatus::Rejected,
                approved_by: None,
                rejected_by: Some(reviewer),
                reviewed_at,
                reject_reason,
            },
        }
    }

    pub fn apply(&self, review: &mut ReviewFields) {
        review.status = self.status;
        review.approved_by = self.approved_by;
        review.rejected_by = self.rejected_by;
        review.reviewed_at = Some(self.reviewed_at);
        review.reject_reason = self.reject_reason.clone();
    }
}

/// The four source ledgers the engine reconciles.
#[derive(Clone)]
pub struct Ledgers {
    pub generic: Arc<dyn Ledger<Row = GenericRow>>,
    pub leave: Arc<dyn Ledger<Row = LeaveRow>>,
    pub early_departure: Arc<dyn Ledger<Row = EarlyDepartureRow>>,
    pub lateness: Arc<dyn Ledger<Row = LatenessRow>>,
}

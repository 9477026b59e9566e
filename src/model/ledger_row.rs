use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::request::{RequestStatus, RequestType};

/// Audit columns every ledger carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReviewFields {
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    pub rejected_by: Option<u64>,
    pub reject_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewFields {
    pub fn pending() -> Self {
        Self {
            status: RequestStatus::Pending,
            approved_by: None,
            rejected_by: None,
            reject_reason: None,
            reviewed_at: None,
        }
    }
}

/// Row of the `requests` table, the only ledger with an explicit type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GenericRow {
    pub id: String,
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
    pub reason: String,
    pub substitute_id: Option<u64>,
    #[sqlx(flatten)]
    pub review: ReviewFields,
    pub created_at: DateTime<Utc>,
}

/// Row of `leave_requests`, shared by planned time-off and unplanned absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LeaveRow {
    pub id: String,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: String,
    pub substitute_id: Option<u64>,
    #[sqlx(flatten)]
    pub review: ReviewFields,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EarlyDepartureRow {
    pub id: String,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub reason: String,
    pub substitute_id: Option<u64>,
    #[sqlx(flatten)]
    pub review: ReviewFields,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LatenessRow {
    pub id: String,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub reason: String,
    pub substitute_id: Option<u64>,
    #[sqlx(flatten)]
    pub review: ReviewFields,
    pub created_at: DateTime<Utc>,
}

/// Identifies a row type by the fields every ledger shares.
pub trait LedgerRow: Clone + Send + Sync {
    fn id(&self) -> &str;
    #[cfg(test)]
    fn owner(&self) -> u64;
    #[cfg(test)]
    fn review_mut(&mut self) -> &mut ReviewFields;
}

macro_rules! impl_ledger_row {
    ($($row:ty),*) => {$(
        impl LedgerRow for $row {
            fn id(&self) -> &str {
                &self.id
            }

            #[cfg(test)]
            fn owner(&self) -> u64 {
                self.employee_id
            }

            #[cfg(test)]
            fn review_mut(&mut self) -> &mut ReviewFields {
                &mut self.review
            }
        }
    )*};
}

impl_ledger_row!(GenericRow, LeaveRow, EarlyDepartureRow, LatenessRow);

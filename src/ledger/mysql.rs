use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::ledger::{Ledger, Ledgers, StatusWrite};
use crate::model::ledger_row::{
    EarlyDepartureRow, GenericRow, LatenessRow, LeaveRow, LedgerRow, ReviewFields,
};
use crate::utils::db_utils::{SqlValue, build_insert, build_status_update, execute};
use std::sync::Arc;

/// Maps a row type onto its MySQL table.
pub trait Table: LedgerRow + for<'r> FromRow<'r, MySqlRow> + Unpin + 'static {
    const TABLE: &'static str;
    /// Column list in the same order as [`Table::values`].
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

fn review_values(review: &ReviewFields) -> [SqlValue; 5] {
    [
        review.status.as_ref().into(),
        review.approved_by.into(),
        review.rejected_by.into(),
        review.reject_reason.clone().into(),
        review.reviewed_at.into(),
    ]
}

impl Table for GenericRow {
    const TABLE: &'static str = "requests";
    const COLUMNS: &'static [&'static str] = &[
        "id", "request_type", "employee_id", "start_date", "end_date", "start_time", "end_time",
        "arrival_time", "reason", "substitute_id", "created_at",
        "status", "approved_by", "rejected_by", "reject_reason", "reviewed_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = vec![
            self.id.clone().into(),
            self.request_type.as_ref().into(),
            self.employee_id.into(),
            self.start_date.into(),
            self.end_date.into(),
            self.start_time.into(),
            self.end_time.into(),
            self.arrival_time.into(),
            self.reason.clone().into(),
            self.substitute_id.into(),
            self.created_at.into(),
        ];
        values.extend(review_values(&self.review));
        values
    }
}

impl Table for LeaveRow {
    const TABLE: &'static str = "leave_requests";
    const COLUMNS: &'static [&'static str] = &[
        "id", "employee_id", "start_date", "end_date", "start_time", "end_time", "reason",
        "substitute_id", "created_at",
        "status", "approved_by", "rejected_by", "reject_reason", "reviewed_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = vec![
            self.id.clone().into(),
            self.employee_id.into(),
            self.start_date.into(),
            self.end_date.into(),
            self.start_time.into(),
            self.end_time.into(),
            self.reason.clone().into(),
            self.substitute_id.into(),
            self.created_at.into(),
        ];
        values.extend(review_values(&self.review));
        values
    }
}

impl Table for EarlyDepartureRow {
    const TABLE: &'static str = "early_departures";
    const COLUMNS: &'static [&'static str] = &[
        "id", "employee_id", "date", "departure_time", "reason", "substitute_id", "created_at",
        "status", "approved_by", "rejected_by", "reject_reason", "reviewed_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = vec![
            self.id.clone().into(),
            self.employee_id.into(),
            self.date.into(),
            self.departure_time.into(),
            self.reason.clone().into(),
            self.substitute_id.into(),
            self.created_at.into(),
        ];
        values.extend(review_values(&self.review));
        values
    }
}

impl Table for LatenessRow {
    const TABLE: &'static str = "lateness_records";
    const COLUMNS: &'static [&'static str] = &[
        "id", "employee_id", "date", "arrival_time", "reason", "substitute_id", "created_at",
        "status", "approved_by", "rejected_by", "reject_reason", "reviewed_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = vec![
            self.id.clone().into(),
            self.employee_id.into(),
            self.date.into(),
            self.arrival_time.into(),
            self.reason.clone().into(),
            self.substitute_id.into(),
            self.created_at.into(),
        ];
        values.extend(review_values(&self.review));
        values
    }
}

/// A ledger backed by one MySQL table.
pub struct MySqlLedger<R> {
    pool: MySqlPool,
    _row: PhantomData<fn() -> R>,
}

impl<R: Table> MySqlLedger<R> {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            _row: PhantomData,
        }
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT {} FROM {} {} ORDER BY created_at DESC",
            R::COLUMNS.join(", "),
            R::TABLE,
            filter
        )
    }

    async fn find(&self, id: &str) -> Result<Option<R>, sqlx::Error> {
        let sql = Self::select_sql("WHERE id = ?");
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl<R: Table> Ledger for MySqlLedger<R> {
    type Row = R;

    async fn list_by_owner(&self, owner: u64) -> Result<Vec<R>, sqlx::Error> {
        let sql = Self::select_sql("WHERE employee_id = ?");
        debug!(sql = %sql, owner, "Listing ledger rows by owner");

        sqlx::query_as::<_, R>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
    }

    async fn list_all(&self) -> Result<Vec<R>, sqlx::Error> {
        let sql = Self::select_sql("");
        debug!(sql = %sql, "Listing all ledger rows");

        sqlx::query_as::<_, R>(&sql).fetch_all(&self.pool).await
    }

    async fn update_status(
        &self,
        id: &str,
        write: &StatusWrite,
    ) -> Result<Option<R>, sqlx::Error> {
        let update = build_status_update(R::TABLE, write, id);
        debug!(sql = %update.sql, id, table = R::TABLE, "Writing review decision");

        execute(&self.pool, update).await?;

        // affected-row counts are unreliable for no-op updates; existence is the re-read
        self.find(id).await
    }

    async fn insert(&self, row: &R) -> Result<(), sqlx::Error> {
        let insert = build_insert(R::TABLE, R::COLUMNS, row.values());
        debug!(sql = %insert.sql, id = row.id(), "Inserting ledger row");

        execute(&self.pool, insert).await.map(|_| ())
    }
}

/// Wires all four ledgers to the same pool.
pub fn mysql_ledgers(pool: &MySqlPool) -> Ledgers {
    Ledgers {
        generic: Arc::new(MySqlLedger::<GenericRow>::new(pool.clone())),
        leave: Arc::new(MySqlLedger::<LeaveRow>::new(pool.clone())),
        early_departure: Arc::new(MySqlLedger::<EarlyDepartureRow>::new(pool.clone())),
        lateness: Arc::new(MySqlLedger::<LatenessRow>::new(pool.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lists_match_bound_values() {
        use chrono::{NaiveDate, NaiveTime, Utc};

        let row = LatenessRow {
            id: "r1".into(),
            employee_id: 4,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            reason: "train delay".into(),
            substitute_id: None,
            review: ReviewFields::pending(),
            created_at: Utc::now(),
        };

        assert_eq!(LatenessRow::COLUMNS.len(), row.values().len());
        assert_eq!(GenericRow::COLUMNS.len(), 16);
        assert_eq!(LeaveRow::COLUMNS.len(), 14);
        assert_eq!(EarlyDepartureRow::COLUMNS.len(), 12);
    }

    #[test]
    fn select_orders_newest_first() {
        let sql = MySqlLedger::<LeaveRow>::select_sql("WHERE employee_id = ?");
        assert!(sql.starts_with("SELECT id, employee_id, start_date"));
        assert!(
            sql.ends_with("FROM leave_requests WHERE employee_id = ? ORDER BY created_at DESC")
        );
    }
}

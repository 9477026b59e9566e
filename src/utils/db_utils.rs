use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::MySqlPool;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;

use crate::ledger::StatusWrite;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// ===============================
/// SQL statement container
/// ===============================
#[derive(Debug)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build the audit UPDATE for a review decision
/// ===============================
pub fn build_status_update(table: &str, write: &StatusWrite, id: &str) -> SqlStatement {
    let columns: [(&str, SqlValue); 5] = [
        ("status", write.status.as_ref().into()),
        ("approved_by", write.approved_by.into()),
        ("rejected_by", write.rejected_by.into()),
        ("reviewed_at", write.reviewed_at.into()),
        ("reject_reason", write.reject_reason.clone().into()),
    ];

    let set_clause = columns
        .iter()
        .map(|(k, _)| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, set_clause);

    let mut values: Vec<SqlValue> = columns.into_iter().map(|(_, v)| v).collect();
    values.push(id.into());

    SqlStatement { sql, values }
}

/// ===============================
/// Build an INSERT over the given columns
/// ===============================
pub fn build_insert(table: &str, columns: &[&str], values: Vec<SqlValue>) -> SqlStatement {
    debug_assert_eq!(columns.len(), values.len());

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    SqlStatement { sql, values }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::String(v) => query.bind(v),
        SqlValue::U64(v) => query.bind(v),
        SqlValue::Date(v) => query.bind(v),
        SqlValue::Time(v) => query.bind(v),
        SqlValue::DateTime(v) => query.bind(v),
        SqlValue::Null => query.bind(None::<String>),
    }
}

/// ===============================
/// Execute the statement
/// ===============================
pub async fn execute(pool: &MySqlPool, statement: SqlStatement) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&statement.sql);

    for value in statement.values {
        query = bind_value(query, value);
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::person::Person;

/// Semantic kind of an absence event.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema,
    Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RequestType {
    TimeOff,
    EarlyDeparture,
    Lateness,
    Absence,
}

impl TryFrom<String> for RequestType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema,
    Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for RequestStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A reviewer's verdict on a request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Canonical, reconciled view of one absence event.
///
/// Produced by the reconciliation engine only; it is never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Request {
    #[schema(example = "5f1c9a52-7d1e-4b0e-9b8e-1f0a3c2d4e5f")]
    pub id: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub occurs_on: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub occurs_through: Option<NaiveDate>,
    /// partial-day leave start, or the departure time of an early departure
    #[schema(example = "14:00:00", value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "09:30:00", value_type = Option<String>)]
    pub arrival_time: Option<NaiveTime>,
    pub reason: String,
    pub requested_by: Person,
    pub reviewed_by: Option<Person>,
    pub substitute: Option<Person>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-02T08:00:00Z", format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
}

/// Payload of a newly submitted request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewRequest {
    #[serde(rename = "type")]
    #[schema(example = "time-off")]
    pub request_type: RequestType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub occurs_on: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub occurs_through: Option<NaiveDate>,
    #[schema(example = "14:00:00", value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "09:30:00", value_type = Option<String>)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    #[schema(example = "family matter")]
    pub reason: String,
    #[schema(example = 1001)]
    pub substitute_id: Option<u64>,
}

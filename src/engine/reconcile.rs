//! Merging of the four source ledgers into one canonical timeline.
//!
//! Everything here is pure: the rows and the people they reference are
//! fetched by [`super::RequestService`] before [`merge`] runs.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::model::ledger_row::{
    EarlyDepartureRow, GenericRow, LatenessRow, LeaveRow, ReviewFields,
};
use crate::model::person::Person;
use crate::model::request::{Request, RequestStatus, RequestType};

/// Rows read from every ledger for one reconciliation.
#[derive(Debug, Default, Clone)]
pub struct Fetched {
    pub generic: Vec<GenericRow>,
    pub leave: Vec<LeaveRow>,
    pub early_departure: Vec<EarlyDepartureRow>,
    pub lateness: Vec<LatenessRow>,
}

impl Fetched {
    /// Every identity the rows point at (owners, reviewers, substitutes), sorted.
    pub fn referenced_people(&self) -> Vec<u64> {
        let mut ids = BTreeSet::new();
        let mut add = |owner: u64, substitute: Option<u64>, review: &ReviewFields| {
            ids.insert(owner);
            ids.extend(substitute);
            ids.extend(review.approved_by);
            ids.extend(review.rejected_by);
        };

        for r in &self.generic {
            add(r.employee_id, r.substitute_id, &r.review);
        }
        for r in &self.leave {
            add(r.employee_id, r.substitute_id, &r.review);
        }
        for r in &self.early_departure {
            add(r.employee_id, r.substitute_id, &r.review);
        }
        for r in &self.lateness {
            add(r.employee_id, r.substitute_id, &r.review);
        }

        ids.into_iter().collect()
    }
}

/// Types a leave-ledger row.
///
/// The generic ledger's tag wins when present; without one, a same-day range
/// is an unplanned absence and anything longer is planned time-off.
pub fn classify_leave(row: &LeaveRow, generic_type: Option<RequestType>) -> RequestType {
    match generic_type {
        Some(tagged) => tagged,
        None if row.start_date == row.end_date => RequestType::Absence,
        None => RequestType::TimeOff,
    }
}

/// The reviewer reference matching the row's status.
///
/// Pending rows never have a reviewer. A decided row that lost its reference
/// gets id 0, which resolves to the unknown-person sentinel.
pub fn reviewer_of(review: &ReviewFields) -> Option<u64> {
    match review.status {
        RequestStatus::Pending => None,
        RequestStatus::Approved => Some(review.approved_by.or(review.rejected_by).unwrap_or(0)),
        RequestStatus::Rejected => Some(review.rejected_by.or(review.approved_by).unwrap_or(0)),
    }
}

struct Draft<'a> {
    id: &'a str,
    request_type: RequestType,
    review: &'a ReviewFields,
    occurs_on: NaiveDate,
    occurs_through: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    arrival_time: Option<NaiveTime>,
    reason: &'a str,
    owner: u64,
    substitute: Option<u64>,
    created_at: DateTime<Utc>,
}

impl Draft<'_> {
    fn into_request(self, people: &HashMap<u64, Person>) -> Request {
        let person = |id: u64| people.get(&id).cloned().unwrap_or_else(|| Person::unknown(id));

        Request {
            id: self.id.to_string(),
            request_type: self.request_type,
            status: self.review.status,
            occurs_on: self.occurs_on,
            occurs_through: self.occurs_through,
            start_time: self.start_time,
            end_time: self.end_time,
            arrival_time: self.arrival_time,
            reason: self.reason.to_string(),
            requested_by: person(self.owner),
            reviewed_by: reviewer_of(self.review).map(person),
            substitute: self.substitute.map(person),
            created_at: self.created_at,
            reviewed_at: self.review.reviewed_at,
            reject_reason: match self.review.status {
                RequestStatus::Rejected => self.review.reject_reason.clone(),
                _ => None,
            },
        }
    }
}

fn index_by_id<R>(rows: &[R], id: impl Fn(&R) -> &str) -> HashMap<&str, &R> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        // first row wins if a ledger ever repeats an id
        index.entry(id(row)).or_insert(row);
    }
    index
}

/// Merges the fetched rows into one de-duplicated sequence, newest first.
///
/// Passes run in ledger order (generic, leave, early departure, lateness) and
/// each pass only takes ids no earlier pass claimed.
pub fn merge(fetched: &Fetched, people: &HashMap<u64, Person>) -> Vec<Request> {
    let leave_by_id = index_by_id(&fetched.leave, |r| r.id.as_str());
    let early_by_id = index_by_id(&fetched.early_departure, |r| r.id.as_str());
    let late_by_id = index_by_id(&fetched.lateness, |r| r.id.as_str());
    let generic_types: HashMap<&str, RequestType> = fetched
        .generic
        .iter()
        .map(|r| (r.id.as_str(), r.request_type))
        .collect();

    let mut claimed: HashSet<&str> = HashSet::new();
    let mut requests = Vec::new();

    for row in &fetched.generic {
        if !claimed.insert(&row.id) {
            continue;
        }
        let leave = leave_by_id.get(row.id.as_str());
        let early = early_by_id.get(row.id.as_str());
        let late = late_by_id.get(row.id.as_str());

        let draft = Draft {
            id: &row.id,
            request_type: row.request_type,
            review: &row.review,
            occurs_on: row.start_date,
            occurs_through: row.end_date.or(leave.map(|l| l.end_date)),
            start_time: row
                .start_time
                .or(leave.and_then(|l| l.start_time))
                .or(early.map(|e| e.departure_time)),
            end_time: row.end_time.or(leave.and_then(|l| l.end_time)),
            arrival_time: row.arrival_time.or(late.map(|l| l.arrival_time)),
            reason: &row.reason,
            owner: row.employee_id,
            substitute: row
                .substitute_id
                .or(leave.and_then(|l| l.substitute_id))
                .or(early.and_then(|e| e.substitute_id))
                .or(late.and_then(|l| l.substitute_id)),
            created_at: row.created_at,
        };
        requests.push(draft.into_request(people));
    }

    for row in &fetched.leave {
        if !claimed.insert(&row.id) {
            continue;
        }
        let draft = Draft {
            id: &row.id,
            request_type: classify_leave(row, generic_types.get(row.id.as_str()).copied()),
            review: &row.review,
            occurs_on: row.start_date,
            occurs_through: Some(row.end_date),
            start_time: row.start_time,
            end_time: row.end_time,
            arrival_time: None,
            reason: &row.reason,
            owner: row.employee_id,
            substitute: row.substitute_id,
            created_at: row.created_at,
        };
        requests.push(draft.into_request(people));
    }

    for row in &fetched.early_departure {
        if !claimed.insert(&row.id) {
            continue;
        }
        let draft = Draft {
            id: &row.id,
            request_type: RequestType::EarlyDeparture,
            review: &row.review,
            occurs_on: row.date,
            occurs_through: None,
            start_time: Some(row.departure_time),
            end_time: None,
            arrival_time: None,
            reason: &row.reason,
            owner: row.employee_id,
            substitute: row.substitute_id,
            created_at: row.created_at,
        };
        requests.push(draft.into_request(people));
    }

    for row in &fetched.lateness {
        if !claimed.insert(&row.id) {
            continue;
        }
        let draft = Draft {
            id: &row.id,
            request_type: RequestType::Lateness,
            review: &row.review,
            occurs_on: row.date,
            occurs_through: None,
            start_time: None,
            end_time: None,
            arrival_time: Some(row.arrival_time),
            reason: &row.reason,
            owner: row.employee_id,
            substitute: row.substitute_id,
            created_at: row.created_at,
        };
        requests.push(draft.into_request(people));
    }

    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    requests
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    pub fn generic(id: &str, request_type: RequestType, owner: u64, day: &str) -> GenericRow {
        GenericRow {
            id: id.into(),
            request_type,
            employee_id: owner,
            start_date: date(day),
            end_date: None,
            start_time: None,
            end_time: None,
            arrival_time: None,
            reason: String::new(),
            substitute_id: None,
            review: ReviewFields::pending(),
            created_at: at(1, 8),
        }
    }

    pub fn leave(id: &str, owner: u64, start: &str, end: &str) -> LeaveRow {
        LeaveRow {
            id: id.into(),
            employee_id: owner,
            start_date: date(start),
            end_date: date(end),
            start_time: None,
            end_time: None,
            reason: String::new(),
            substitute_id: None,
            review: ReviewFields::pending(),
            created_at: at(1, 8),
        }
    }

    pub fn early(id: &str, owner: u64, day: &str, departs: &str) -> EarlyDepartureRow {
        EarlyDepartureRow {
            id: id.into(),
            employee_id: owner,
            date: date(day),
            departure_time: time(departs),
            reason: String::new(),
            substitute_id: None,
            review: ReviewFields::pending(),
            created_at: at(1, 8),
        }
    }

    pub fn late(id: &str, owner: u64, day: &str, arrives: &str) -> LatenessRow {
        LatenessRow {
            id: id.into(),
            employee_id: owner,
            date: date(day),
            arrival_time: time(arrives),
            reason: String::new(),
            substitute_id: None,
            review: ReviewFields::pending(),
            created_at: at(1, 8),
        }
    }
}

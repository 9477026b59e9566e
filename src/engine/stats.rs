use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::request::{Request, RequestStatus, RequestType};

/// Which statuses a count includes.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Approved,
    Pending,
}

impl StatusFilter {
    pub fn admits(&self, status: RequestStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Approved => status == RequestStatus::Approved,
            StatusFilter::Pending => status == RequestStatus::Pending,
        }
    }
}

/// A calendar year, or one month of it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Window {
    pub year: i32,
    pub month: Option<u32>,
}

impl Window {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day.year() == self.year && self.month.is_none_or(|m| day.month() == m)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct TypeCounts {
    #[schema(example = 4)]
    pub time_off: u64,
    #[schema(example = 1)]
    pub early_departure: u64,
    #[schema(example = 2)]
    pub lateness: u64,
    #[schema(example = 0)]
    pub absence: u64,
}

impl TypeCounts {
    #[cfg(test)]
    pub fn get(&self, request_type: RequestType) -> u64 {
        match request_type {
            RequestType::TimeOff => self.time_off,
            RequestType::EarlyDeparture => self.early_departure,
            RequestType::Lateness => self.lateness,
            RequestType::Absence => self.absence,
        }
    }

    fn bump(&mut self, request_type: RequestType) {
        let slot = match request_type {
            RequestType::TimeOff => &mut self.time_off,
            RequestType::EarlyDeparture => &mut self.early_departure,
            RequestType::Lateness => &mut self.lateness,
            RequestType::Absence => &mut self.absence,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.time_off + self.early_departure + self.lateness + self.absence
    }
}

/// Counts requests per type whose `occurs_on` falls in `window` and whose
/// status passes `filter`.
pub fn aggregate(requests: &[Request], window: Window, filter: StatusFilter) -> TypeCounts {
    requests
        .iter()
        .filter(|r| window.contains(r.occurs_on))
        .filter(|r| filter.admits(r.status))
        .fold(TypeCounts::default(), |mut counts, r| {
            counts.bump(r.request_type);
            counts
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::engine::reconcile::fixtures::*;
    use crate::engine::reconcile::{Fetched, merge};

    fn requests() -> Vec<Request> {
        let mut approved_off = leave("a", 1, "2025-09-02", "2025-09-04");
        approved_off.review.status = RequestStatus::Approved;
        approved_off.review.approved_by = Some(2);

        let mut rejected_late = late("b", 1, "2025-09-10", "09:30");
        rejected_late.review.status = RequestStatus::Rejected;
        rejected_late.review.rejected_by = Some(2);

        let fetched = Fetched {
            leave: vec![
                approved_off,
                leave("c", 1, "2025-09-15", "2025-09-15"),
                leave("d", 1, "2025-10-01", "2025-10-03"),
            ],
            early_departure: vec![early("e", 2, "2025-09-20", "16:00")],
            lateness: vec![rejected_late, late("f", 3, "2024-09-10", "09:05")],
            ..Default::default()
        };
        merge(&fetched, &HashMap::new())
    }

    #[test]
    fn month_window_counts_all_statuses() {
        let counts = aggregate(&requests(), Window::month(2025, 9), StatusFilter::All);

        assert_eq!(
            counts,
            TypeCounts {
                time_off: 1,
                early_departure: 1,
                lateness: 1,
                absence: 1
            }
        );
    }

    #[test]
    fn status_filter_applies_after_window() {
        let all = requests();

        let approved = aggregate(&all, Window::month(2025, 9), StatusFilter::Approved);
        assert_eq!(approved.total(), 1);
        assert_eq!(approved.time_off, 1);

        let pending = aggregate(&all, Window::month(2025, 9), StatusFilter::Pending);
        assert_eq!(pending.total(), 2);
        assert_eq!(pending.absence, 1);
        assert_eq!(pending.early_departure, 1);
    }

    #[test]
    fn year_window_spans_months_but_not_years() {
        let counts = aggregate(&requests(), Window::year(2025), StatusFilter::All);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.time_off, 2);
    }

    #[test]
    fn all_filter_total_matches_window_size() {
        let all = requests();
        let windows = [
            Window::year(2024),
            Window::year(2025),
            Window::month(2025, 10),
            Window::month(2025, 1),
        ];
        for window in windows {
            let in_window = all.iter().filter(|r| window.contains(r.occurs_on)).count() as u64;
            let counts = aggregate(&all, window, StatusFilter::All);
            assert_eq!(counts.total(), in_window);
            assert_eq!(RequestType::iter().map(|t| counts.get(t)).sum::<u64>(), in_window);
        }
    }

    #[test]
    fn no_approved_requests_in_window_is_all_zero() {
        let counts = aggregate(&requests(), Window::month(2025, 10), StatusFilter::Approved);
        assert_eq!(counts, TypeCounts::default());

        assert_eq!(aggregate(&[], Window::year(2025), StatusFilter::All), TypeCounts::default());
    }

    #[test]
    fn counts_serialize_with_type_names() {
        let json = serde_json::to_value(TypeCounts { time_off: 2, ..Default::default() }).unwrap();
        assert_eq!(json["time-off"], 2);
        assert_eq!(json["early-departure"], 0);
    }
}

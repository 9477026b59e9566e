use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::reconcile::Fetched;
use super::{MirrorOutcome, RequestService};
use crate::error::{EngineError, Store};
use crate::ledger::Ledger;
use crate::model::ledger_row::{
    EarlyDepartureRow, GenericRow, LatenessRow, LeaveRow, LedgerRow, ReviewFields,
};
use crate::model::request::{NewRequest, Request, RequestType};

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub request: Request,
    pub mirror: MirrorOutcome,
}

/// Rejects payloads that could not be reconciled back into the same request.
pub fn validate(new: &NewRequest) -> Result<(), EngineError> {
    if let Some(through) = new.occurs_through {
        if through < new.occurs_on {
            return Err(EngineError::Invalid(
                "start date cannot be after end date".to_string(),
            ));
        }
    }

    let single_day = new.occurs_through.is_none_or(|d| d == new.occurs_on);

    match new.request_type {
        RequestType::Lateness => {
            if new.arrival_time.is_none() {
                return Err(EngineError::Invalid(
                    "lateness requires an arrival time".to_string(),
                ));
            }
            if !single_day {
                return Err(EngineError::Invalid("lateness covers a single day".to_string()));
            }
        }
        RequestType::EarlyDeparture => {
            if new.start_time.is_none() {
                return Err(EngineError::Invalid(
                    "early departure requires a departure time".to_string(),
                ));
            }
            if !single_day {
                return Err(EngineError::Invalid(
                    "early departure covers a single day".to_string(),
                ));
            }
        }
        RequestType::TimeOff | RequestType::Absence => {}
    }

    if let (Some(start), Some(end)) = (new.start_time, new.end_time) {
        if end <= start {
            return Err(EngineError::Invalid(
                "end time must be after start time".to_string(),
            ));
        }
    }

    Ok(())
}

/// Best-effort insert of the specialized counterpart.
async fn insert_counterpart<R: LedgerRow>(
    ledger: &dyn Ledger<Row = R>,
    store: Store,
    row: R,
) -> (MirrorOutcome, Option<R>) {
    match ledger.insert(&row).await {
        Ok(()) => (MirrorOutcome::Mirrored(store), Some(row)),
        Err(e) => {
            warn!(error = %e, id = row.id(), ledger = %store, "Specialized insert failed");
            let outcome = MirrorOutcome::Failed {
                ledger: store,
                reason: e.to_string(),
            };
            (outcome, None)
        }
    }
}

impl RequestService {
    /// Records a new pending request for `owner`.
    ///
    /// The generic row is written first and is authoritative; the matching
    /// specialized row follows and may fail without undoing the submission.
    #[instrument(name = "submit", skip(self, new), fields(request_type = %new.request_type))]
    pub async fn submit(&self, owner: u64, new: NewRequest) -> Result<SubmitOutcome, EngineError> {
        validate(&new)?;

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let generic = GenericRow {
            id: id.clone(),
            request_type: new.request_type,
            employee_id: owner,
            start_date: new.occurs_on,
            end_date: new.occurs_through,
            start_time: new.start_time,
            end_time: new.end_time,
            arrival_time: new.arrival_time,
            reason: new.reason.clone(),
            substitute_id: new.substitute_id,
            review: ReviewFields::pending(),
            created_at,
        };

        self.ledgers
            .generic
            .insert(&generic)
            .await
            .map_err(EngineError::unavailable(Store::Generic))?;

        let ledgers = &self.ledgers;
        let mut fetched = Fetched::default();
        let mirror = match new.request_type {
            RequestType::TimeOff | RequestType::Absence => {
                let row = LeaveRow {
                    id: id.clone(),
                    employee_id: owner,
                    start_date: new.occurs_on,
                    end_date: new.occurs_through.unwrap_or(new.occurs_on),
                    start_time: new.start_time,
                    end_time: new.end_time,
                    reason: new.reason.clone(),
                    substitute_id: new.substitute_id,
                    review: ReviewFields::pending(),
                    created_at,
                };
                let (outcome, row) =
                    insert_counterpart(ledgers.leave.as_ref(), Store::Leave, row).await;
                fetched.leave.extend(row);
                outcome
            }
            RequestType::EarlyDeparture => {
                let row = EarlyDepartureRow {
                    id: id.clone(),
                    employee_id: owner,
                    date: new.occurs_on,
                    departure_time: new.start_time.ok_or_else(|| {
                        EngineError::Invalid(
                            "early departure requires a departure time".to_string(),
                        )
                    })?,
                    reason: new.reason.clone(),
                    substitute_id: new.substitute_id,
                    review: ReviewFields::pending(),
                    created_at,
                };
                let (outcome, row) = insert_counterpart(
                    ledgers.early_departure.as_ref(),
                    Store::EarlyDeparture,
                    row,
                )
                .await;
                fetched.early_departure.extend(row);
                outcome
            }
            RequestType::Lateness => {
                let row = LatenessRow {
                    id: id.clone(),
                    employee_id: owner,
                    date: new.occurs_on,
                    arrival_time: new.arrival_time.ok_or_else(|| {
                        EngineError::Invalid("lateness requires an arrival time".to_string())
                    })?,
                    reason: new.reason.clone(),
                    substitute_id: new.substitute_id,
                    review: ReviewFields::pending(),
                    created_at,
                };
                let (outcome, row) =
                    insert_counterpart(ledgers.lateness.as_ref(), Store::Lateness, row).await;
                fetched.lateness.extend(row);
                outcome
            }
        };
        fetched.generic.push(generic);

        let request = self
            .describe(&fetched)
            .await
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;

        info!(id = %id, owner, "Request submitted");
        Ok(SubmitOutcome { request, mirror })
    }
}

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::reconcile::Fetched;
use super::{MirrorOutcome, RequestService};
use crate::error::{EngineError, Store};
use crate::ledger::{Ledger, StatusWrite};
use crate::model::ledger_row::{GenericRow, LedgerRow};
use crate::model::request::{Decision, Request, RequestType};

/// Result of a successful approve/reject.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: Request,
    /// ledger that held the row and received the primary write
    pub ledger: Store,
    pub mirror: MirrorOutcome,
}

/// Writes the decision into a specialized ledger after the generic ledger took it.
/// Failures are reported in the outcome, never raised.
pub(crate) async fn mirror_into<R: LedgerRow>(
    ledger: &dyn Ledger<Row = R>,
    store: Store,
    id: &str,
    write: &StatusWrite,
) -> (MirrorOutcome, Option<R>) {
    match ledger.update_status(id, write).await {
        Ok(Some(row)) => (MirrorOutcome::Mirrored(store), Some(row)),
        Ok(None) => {
            warn!(id, ledger = %store, "Mirror target row missing");
            let outcome = MirrorOutcome::Failed {
                ledger: store,
                reason: "row not found".to_string(),
            };
            (outcome, None)
        }
        Err(e) => {
            warn!(error = %e, id, ledger = %store, "Mirror write failed");
            let outcome = MirrorOutcome::Failed {
                ledger: store,
                reason: e.to_string(),
            };
            (outcome, None)
        }
    }
}

impl RequestService {
    /// Applies `decision` to the request with `id`.
    ///
    /// Ledgers are probed generic, leave, early departure, lateness; the first
    /// one holding the id takes the write. Concurrent decisions on the same id
    /// are last-writer-wins.
    #[instrument(name = "transition", skip(self, reject_reason))]
    pub async fn transition(
        &self,
        id: &str,
        decision: Decision,
        reviewer: u64,
        reject_reason: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        let write = StatusWrite::decide(decision, reviewer, reject_reason, Utc::now());
        let ledgers = &self.ledgers;

        let mut fetched = Fetched::default();
        let (ledger, mirror) = if let Some(row) = ledgers
            .generic
            .update_status(id, &write)
            .await
            .map_err(EngineError::unavailable(Store::Generic))?
        {
            let mirror = self.mirror(&row, &write, &mut fetched).await;
            fetched.generic.push(row);
            (Store::Generic, mirror)
        } else if let Some(row) = ledgers
            .leave
            .update_status(id, &write)
            .await
            .map_err(EngineError::unavailable(Store::Leave))?
        {
            fetched.leave.push(row);
            (Store::Leave, MirrorOutcome::NotRequired)
        } else if let Some(row) = ledgers
            .early_departure
            .update_status(id, &write)
            .await
            .map_err(EngineError::unavailable(Store::EarlyDeparture))?
        {
            fetched.early_departure.push(row);
            (Store::EarlyDeparture, MirrorOutcome::NotRequired)
        } else if let Some(row) = ledgers
            .lateness
            .update_status(id, &write)
            .await
            .map_err(EngineError::unavailable(Store::Lateness))?
        {
            fetched.lateness.push(row);
            (Store::Lateness, MirrorOutcome::NotRequired)
        } else {
            info!(id, "Transition target not found in any ledger");
            return Err(EngineError::NotFound(id.to_string()));
        };

        let request = self
            .describe(&fetched)
            .await
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        info!(id, ledger = %ledger, status = %request.status, "Request transitioned");
        Ok(TransitionOutcome {
            request,
            ledger,
            mirror,
        })
    }

    async fn mirror(
        &self,
        row: &GenericRow,
        write: &StatusWrite,
        fetched: &mut Fetched,
    ) -> MirrorOutcome {
        let ledgers = &self.ledgers;
        match row.request_type {
            RequestType::TimeOff => {
                let (outcome, mirrored) =
                    mirror_into(ledgers.leave.as_ref(), Store::Leave, &row.id, write).await;
                fetched.leave.extend(mirrored);
                outcome
            }
            RequestType::EarlyDeparture => {
                let (outcome, mirrored) = mirror_into(
                    ledgers.early_departure.as_ref(),
                    Store::EarlyDeparture,
                    &row.id,
                    write,
                )
                .await;
                fetched.early_departure.extend(mirrored);
                outcome
            }
            RequestType::Lateness => {
                let (outcome, mirrored) =
                    mirror_into(ledgers.lateness.as_ref(), Store::Lateness, &row.id, write).await;
                fetched.lateness.extend(mirrored);
                outcome
            }
            RequestType::Absence => MirrorOutcome::NotRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile::fixtures::*;
    use crate::engine::testing::{Harness, directory};
    use crate::ledger::memory::MemoryLedger;
    use crate::model::request::RequestStatus;

    #[actix_web::test]
    async fn approving_leave_only_row_skips_mirror() {
        let harness = Harness::with_rows(
            vec![],
            vec![leave("t1", 1, "2024-03-01", "2024-03-01")],
            vec![],
            vec![],
        );

        let outcome = harness
            .service
            .transition("t1", Decision::Approved, 2, None)
            .await
            .unwrap();

        assert_eq!(outcome.ledger, Store::Leave);
        assert_eq!(outcome.mirror, MirrorOutcome::NotRequired);
        assert_eq!(outcome.request.status, RequestStatus::Approved);
        assert_eq!(outcome.request.request_type, RequestType::Absence);
        let reviewer = outcome.request.reviewed_by.unwrap();
        assert_eq!(reviewer.id, 2);
        assert_eq!(reviewer.display_name, "Grace Hopper");
        assert_eq!(harness.leave.writes(), 1);
        assert_eq!(harness.generic.writes(), 0);
    }

    #[actix_web::test]
    async fn generic_time_off_is_mirrored_into_leave() {
        let harness = Harness::with_rows(
            vec![generic("g1", RequestType::TimeOff, 1, "2024-03-04")],
            vec![leave("g1", 1, "2024-03-04", "2024-03-06")],
            vec![],
            vec![],
        );

        let outcome = harness
            .service
            .transition("g1", Decision::Rejected, 2, Some("quarter close".into()))
            .await
            .unwrap();

        assert_eq!(outcome.ledger, Store::Generic);
        assert_eq!(outcome.mirror, MirrorOutcome::Mirrored(Store::Leave));
        assert_eq!(outcome.request.reject_reason.as_deref(), Some("quarter close"));
        assert_eq!(outcome.request.occurs_through, Some(date("2024-03-06")));

        let mirrored = harness.leave.get("g1").unwrap();
        assert_eq!(mirrored.review.status, RequestStatus::Rejected);
        assert_eq!(mirrored.review.rejected_by, Some(2));
        assert_eq!(mirrored.review.approved_by, None);
    }

    #[actix_web::test]
    async fn generic_early_departure_is_mirrored() {
        let harness = Harness::with_rows(
            vec![generic("e1", RequestType::EarlyDeparture, 3, "2024-03-07")],
            vec![],
            vec![early("e1", 3, "2024-03-07", "15:00")],
            vec![],
        );

        let outcome = harness
            .service
            .transition("e1", Decision::Approved, 2, None)
            .await
            .unwrap();

        assert_eq!(outcome.mirror, MirrorOutcome::Mirrored(Store::EarlyDeparture));
        assert_eq!(outcome.request.start_time, Some(time("15:00")));

        let mirrored = harness.early_departure.get("e1").unwrap();
        assert_eq!(mirrored.review.status, RequestStatus::Approved);
        assert_eq!(mirrored.review.approved_by, Some(2));
        assert_eq!(harness.early_departure.writes(), 1);
    }

    #[actix_web::test]
    async fn generic_absence_is_not_mirrored() {
        let harness = Harness::with_rows(
            vec![generic("a1", RequestType::Absence, 1, "2024-03-04")],
            vec![leave("a1", 1, "2024-03-04", "2024-03-04")],
            vec![],
            vec![],
        );

        let outcome = harness
            .service
            .transition("a1", Decision::Approved, 3, None)
            .await
            .unwrap();

        assert_eq!(outcome.mirror, MirrorOutcome::NotRequired);
        assert_eq!(harness.leave.writes(), 0);
        assert_eq!(harness.leave.get("a1").unwrap().review.status, RequestStatus::Pending);
    }

    #[actix_web::test]
    async fn mirror_failure_is_reported_not_raised() {
        let harness = Harness::new(
            MemoryLedger::new(vec![generic("r1", RequestType::Lateness, 1, "2024-03-01")]),
            MemoryLedger::new(vec![]),
            MemoryLedger::new(vec![]),
            MemoryLedger::new(vec![late("r1", 1, "2024-03-01", "09:30")]).fail_writes(),
            directory(),
        );

        let outcome = harness
            .service
            .transition("r1", Decision::Approved, 2, None)
            .await
            .unwrap();

        assert!(outcome.mirror.is_failed());
        assert_eq!(outcome.request.status, RequestStatus::Approved);
        assert_eq!(
            harness.generic.get("r1").unwrap().review.status,
            RequestStatus::Approved
        );
        assert_eq!(harness.lateness.get("r1").unwrap().review.status, RequestStatus::Pending);
    }

    #[actix_web::test]
    async fn missing_mirror_row_is_a_failed_mirror() {
        let harness = Harness::with_rows(
            vec![generic("e1", RequestType::EarlyDeparture, 1, "2024-03-01")],
            vec![],
            vec![],
            vec![],
        );

        let outcome = harness
            .service
            .transition("e1", Decision::Approved, 2, None)
            .await
            .unwrap();

        assert_eq!(
            outcome.mirror,
            MirrorOutcome::Failed {
                ledger: Store::EarlyDeparture,
                reason: "row not found".into()
            }
        );
    }

    #[actix_web::test]
    async fn unknown_id_is_not_found() {
        let harness = Harness::with_rows(vec![], vec![], vec![], vec![]);

        let err = harness
            .service
            .transition("nope", Decision::Approved, 2, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NotFound(id) if id == "nope"));
    }

    #[actix_web::test]
    async fn primary_write_failure_aborts() {
        let harness = Harness::new(
            MemoryLedger::new(vec![]).fail_writes(),
            MemoryLedger::new(vec![leave("t1", 1, "2024-03-01", "2024-03-01")]),
            MemoryLedger::new(vec![]),
            MemoryLedger::new(vec![]),
            directory(),
        );

        let err = harness
            .service
            .transition("t1", Decision::Approved, 2, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SourceUnavailable { store: Store::Generic, .. }));
        assert_eq!(harness.leave.writes(), 0);
    }

    #[actix_web::test]
    async fn lateness_only_row_is_found_last() {
        let harness = Harness::with_rows(
            vec![],
            vec![],
            vec![early("x", 1, "2024-03-01", "15:00")],
            vec![late("y", 1, "2024-03-01", "09:40")],
        );

        let outcome = harness
            .service
            .transition("y", Decision::Rejected, 3, None)
            .await
            .unwrap();

        assert_eq!(outcome.ledger, Store::Lateness);
        assert_eq!(outcome.request.request_type, RequestType::Lateness);
        assert_eq!(outcome.request.reviewed_by.unwrap().id, 3);
    }

    #[actix_web::test]
    async fn re_deciding_overwrites_previous_decision() {
        let harness = Harness::with_rows(
            vec![],
            vec![leave("t2", 1, "2024-03-01", "2024-03-05")],
            vec![],
            vec![],
        );

        harness
            .service
            .transition("t2", Decision::Rejected, 2, Some("overlap".into()))
            .await
            .unwrap();
        let outcome = harness
            .service
            .transition("t2", Decision::Approved, 3, None)
            .await
            .unwrap();

        let row = harness.leave.get("t2").unwrap();
        assert_eq!(row.review.approved_by, Some(3));
        assert_eq!(row.review.rejected_by, None);
        assert_eq!(row.review.reject_reason, None);
        assert_eq!(outcome.request.reject_reason, None);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::directory::{self, IdentityDirectory};
use crate::error::{EngineError, Store};
use crate::ledger::{Ledger, Ledgers};
use crate::model::ledger_row::LedgerRow;
use crate::model::person::Person;
use crate::model::request::Request;

pub mod reconcile;
pub mod stats;
pub mod submit;
pub mod transition;

use reconcile::Fetched;

/// Outcome of the secondary write into a specialized ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// the primary ledger has no specialized counterpart for this type
    NotRequired,
    Mirrored(Store),
    Failed { ledger: Store, reason: String },
}

impl MirrorOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, MirrorOutcome::Failed { .. })
    }
}

/// Reconciles, transitions and submits absence requests over the source ledgers.
#[derive(Clone)]
pub struct RequestService {
    ledgers: Ledgers,
    directory: Arc<dyn IdentityDirectory>,
}

async fn read<R: LedgerRow>(
    ledger: &dyn Ledger<Row = R>,
    owner: Option<u64>,
    store: Store,
) -> Result<Vec<R>, EngineError> {
    let rows = match owner {
        Some(owner) => ledger.list_by_owner(owner).await,
        None => ledger.list_all().await,
    };
    rows.map_err(EngineError::unavailable(store))
}

impl RequestService {
    pub fn new(ledgers: Ledgers, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { ledgers, directory }
    }

    /// Canonical requests of one owner, or of everyone when `owner` is `None`,
    /// newest first and with no id repeated.
    #[instrument(name = "reconcile", skip(self))]
    pub async fn reconcile(&self, owner: Option<u64>) -> Result<Vec<Request>, EngineError> {
        let ledgers = &self.ledgers;
        let (generic, leave, early_departure, lateness) = futures::try_join!(
            read(ledgers.generic.as_ref(), owner, Store::Generic),
            read(ledgers.leave.as_ref(), owner, Store::Leave),
            read(ledgers.early_departure.as_ref(), owner, Store::EarlyDeparture),
            read(ledgers.lateness.as_ref(), owner, Store::Lateness),
        )?;

        let fetched = Fetched {
            generic,
            leave,
            early_departure,
            lateness,
        };
        debug!(
            generic = fetched.generic.len(),
            leave = fetched.leave.len(),
            early_departure = fetched.early_departure.len(),
            lateness = fetched.lateness.len(),
            "Ledgers fetched"
        );

        let people = self.people(&fetched).await?;
        let requests = reconcile::merge(&fetched, &people);

        debug!(count = requests.len(), "Reconciled requests");
        Ok(requests)
    }

    async fn people(&self, fetched: &Fetched) -> Result<HashMap<u64, Person>, EngineError> {
        let ids = fetched.referenced_people();
        let found = self
            .directory
            .resolve_many(&ids)
            .await
            .map_err(EngineError::unavailable(Store::Directory))?;
        Ok(directory::complete(&ids, found))
    }

    /// Builds the canonical view of rows that were already written.
    ///
    /// The write is committed at this point, so a directory failure degrades
    /// every name to the sentinel instead of reporting an error.
    async fn describe(&self, fetched: &Fetched) -> Option<Request> {
        let people = match self.people(fetched).await {
            Ok(people) => people,
            Err(e) => {
                warn!(error = %e, "Directory unavailable while describing a written request");
                HashMap::new()
            }
        };
        reconcile::merge(fetched, &people).into_iter().next()
    }
}

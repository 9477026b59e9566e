use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::ledger::{Ledger, StatusWrite};
use crate::model::ledger_row::LedgerRow;

/// In-process ledger used by the engine tests.
pub struct MemoryLedger<R> {
    rows: Mutex<Vec<R>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl<R: LedgerRow> MemoryLedger<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Number of successful status updates and inserts.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), sqlx::Error> {
        if flag.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<R: LedgerRow + 'static> Ledger for MemoryLedger<R> {
    type Row = R;

    async fn list_by_owner(&self, owner: u64) -> Result<Vec<R>, sqlx::Error> {
        self.check(&self.fail_reads)?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<R>, sqlx::Error> {
        self.check(&self.fail_reads)?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_status(&self, id: &str, write: &StatusWrite) -> Result<Option<R>, sqlx::Error> {
        self.check(&self.fail_writes)?;
        let mut rows = self.rows.lock().unwrap();
        let updated = rows.iter_mut().find(|r| r.id() == id).map(|row| {
            write.apply(row.review_mut());
            row.clone()
        });
        if updated.is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(updated)
    }

    async fn insert(&self, row: &R) -> Result<(), sqlx::Error> {
        self.check(&self.fail_writes)?;
        self.rows.lock().unwrap().push(row.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

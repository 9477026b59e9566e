use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::directory::{IdentityDirectory, PERSON_SELECT};
use crate::model::person::Person;

/// Directory lookups served from memory, falling back to one bulk call for misses.
pub struct CachedDirectory {
    inner: Arc<dyn IdentityDirectory>,
    cache: Cache<u64, Person>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn IdentityDirectory>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity) // tune based on head count
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Batch insert people into the cache
    async fn batch_insert(&self, people: &[Person]) {
        let futures: Vec<_> = people
            .iter()
            .map(|p| self.cache.insert(p.id, p.clone()))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load active employees into the in-memory cache (batched)
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let sql = format!("{} WHERE e.status = 'active' ORDER BY e.id", PERSON_SELECT);
        let mut stream = sqlx::query_as::<_, Person>(&sql).fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_insert(&batch).await;
                batch.clear();
            }
        }

        // Insert any remaining people
        if !batch.is_empty() {
            self.batch_insert(&batch).await;
        }

        log::info!("Directory cache warmup complete: {} employees", total_count);

        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for CachedDirectory {
    async fn resolve_many(&self, ids: &[u64]) -> Result<HashMap<u64, Person>, sqlx::Error> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut misses = Vec::new();

        for id in ids {
            match self.cache.get(id).await {
                Some(person) => {
                    found.insert(*id, person);
                }
                None => misses.push(*id),
            }
        }

        if misses.is_empty() {
            return Ok(found);
        }

        let fetched = self.inner.resolve_many(&misses).await?;
        self.batch_insert(&fetched.values().cloned().collect::<Vec<_>>())
            .await;
        found.extend(fetched);

        Ok(found)
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use crate::model::person::Person;

/// Resolves employee ids to display names and organizational units.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Ids absent from the returned map are unknown to the directory.
    async fn resolve_many(&self, ids: &[u64]) -> Result<HashMap<u64, Person>, sqlx::Error>;
}

/// Builds the lookup table callers index into, filling gaps with the
/// unknown-person sentinel.
pub fn complete(ids: &[u64], mut found: HashMap<u64, Person>) -> HashMap<u64, Person> {
    for id in ids {
        found.entry(*id).or_insert_with(|| Person::unknown(*id));
    }
    found
}

pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub(crate) const PERSON_SELECT: &str = r#"
    SELECT
        e.id,
        CONCAT_WS(' ', e.first_name, e.last_name) AS display_name,
        d.name AS department,
        d.factory AS factory
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
"#;

#[async_trait]
impl IdentityDirectory for MySqlDirectory {
    async fn resolve_many(&self, ids: &[u64]) -> Result<HashMap<u64, Person>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(PERSON_SELECT);
        builder.push(" WHERE e.id IN (");
        {
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
        }
        builder.push(")");

        debug!(count = ids.len(), "Resolving people from directory");

        let people = builder
            .build_query_as::<Person>()
            .fetch_all(&self.pool)
            .await?;

        Ok(people.into_iter().map(|p| (p.id, p)).collect())
    }
}

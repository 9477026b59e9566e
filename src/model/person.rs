use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrgUnit {
    #[schema(example = "Assembly")]
    pub department: Option<String>,
    #[schema(example = "North Plant")]
    pub factory: Option<String>,
}

/// A resolved identity reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Person {
    #[schema(example = 1000)]
    pub id: u64,
    #[schema(example = "John Doe")]
    pub display_name: String,
    #[sqlx(flatten)]
    pub org_unit: OrgUnit,
}

impl Person {
    /// Sentinel for ids the directory could not resolve.
    pub fn unknown(id: u64) -> Self {
        Self {
            id,
            display_name: UNKNOWN_DISPLAY_NAME.to_string(),
            org_unit: OrgUnit::default(),
        }
    }

    #[cfg(test)]
    pub fn is_unknown(&self) -> bool {
        self.display_name == UNKNOWN_DISPLAY_NAME && self.org_unit == OrgUnit::default()
    }
}

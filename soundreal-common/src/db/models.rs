//! Database models

use serde::{Deserialize, Serialize};

/// One row of the `profiles` table, as read by this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub has_access: bool,
    pub plan_type: Option<String>,
    pub words_used: i64,
    pub words_limit: Option<i64>,
    pub transformations_used: i64,
    pub transformations_limit: Option<i64>,
}

/// Raw column values; every column may be NULL in the hosted schema
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub id: String,
    pub has_access: Option<bool>,
    pub plan_type: Option<String>,
    pub words_used: Option<i64>,
    pub words_limit: Option<i64>,
    pub transformations_used: Option<i64>,
    pub transformations_limit: Option<i64>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            has_access: row.has_access.unwrap_or(false),
            plan_type: row.plan_type,
            words_used: row.words_used.unwrap_or(0),
            words_limit: row.words_limit,
            transformations_used: row.transformations_used.unwrap_or(0),
            transformations_limit: row.transformations_limit,
        }
    }
}

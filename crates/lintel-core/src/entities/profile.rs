use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A quality profile grouping active rules for one language.
///
/// Minimal surface: synchronization only needs profiles as the anchor for
/// active-rule rows; profile management itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QualityProfile {
    pub id: String,
    pub name: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

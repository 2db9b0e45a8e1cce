use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Display metadata for an available rule repository.
///
/// The persisted list is replaced wholesale on every synchronization pass;
/// nothing references it by foreign key.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RepoMeta {
    pub key: String,
    pub language: String,
    pub name: String,
}

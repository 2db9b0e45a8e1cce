//! Rule database configuration.

use serde::{Deserialize, Serialize};

/// Default on-disk database path.
fn default_path() -> String {
    ".lintel/rules.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file. `:memory:` for ephemeral runs.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_project_dir() {
        assert_eq!(DatabaseConfig::default().path, ".lintel/rules.db");
    }
}

//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default log filter when `LINTEL_LOG` is unset.
fn default_log() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default tracing filter directive.
    #[serde(default = "default_log")]
    pub log: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log: default_log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(GeneralConfig::default().log, "warn");
    }
}

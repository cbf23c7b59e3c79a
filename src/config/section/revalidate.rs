//! `[revalidate]` section configuration.
//!
//! ```toml
//! [revalidate]
//! endpoint = "/__swdev/revalidate"   # POST target on the page origin
//! timeout_ms = 5000                  # give up on a hung server
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Revalidation request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl RevalidateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            endpoint: "/__swdev/revalidate".into(),
            timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_revalidate_config() {
        let config = test_parse_config("[revalidate]\ntimeout_ms = 100");
        assert_eq!(config.revalidate.endpoint, "/__swdev/revalidate");
        assert_eq!(config.revalidate.timeout().as_millis(), 100);
    }
}

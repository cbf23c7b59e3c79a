//! `[worker]` section configuration.
//!
//! ```toml
//! [worker]
//! script = "/__swdev-worker.js"   # well-known worker script path
//! update_interval_secs = 60       # how often to check for a newer script
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Path of the worker script on the page origin.
    pub script: String,

    /// Seconds between update checks.
    pub update_interval_secs: u64,
}

impl WorkerConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            script: "/__swdev-worker.js".into(),
            update_interval_secs: 60,
        }
    }
}

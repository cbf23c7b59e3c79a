//! `[page]` section configuration.
//!
//! ```toml
//! [page]
//! origin = "http://localhost:7777"   # dev server the client is attached to
//! ```

use serde::{Deserialize, Serialize};

/// Page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Scheme, host and port that `/`-relative paths resolve against.
    pub origin: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:7777".into(),
        }
    }
}

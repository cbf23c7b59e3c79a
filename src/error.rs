//! Reload error taxonomy.
//!
//! | Variant                  | Fatal | Surfaces where                     |
//! |--------------------------|-------|------------------------------------|
//! | `UnsupportedEnvironment` | yes   | `Coordinator::start`               |
//! | `Registration`           | yes   | `Coordinator::start`               |
//! | `ChannelUnavailable`     | no    | logged, reload runs without socket |
//! | `RevalidationFailed`     | no    | logged by the revalidator          |
//! | `ModuleLoadFailed`       | yes   | caller of `ModuleRunner::run`      |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("this environment can not host a background worker")]
    UnsupportedEnvironment,

    #[error("worker registration failed")]
    Registration(#[source] anyhow::Error),

    #[error("command channel `{endpoint}` unavailable")]
    ChannelUnavailable {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("revalidation failed: {0}")]
    RevalidationFailed(String),

    #[error("failed to load module `{url}`")]
    ModuleLoadFailed {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ReloadError {
    pub fn channel_unavailable(endpoint: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::ChannelUnavailable {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    pub fn module_load_failed(url: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::ModuleLoadFailed {
            url: url.into(),
            source: source.into(),
        }
    }
}

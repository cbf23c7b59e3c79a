//! Hosting-environment capability for the background worker.
//!
//! The controller only talks to these traits; what "registering a worker"
//! means is up to the host.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Called whenever a (new) worker takes control of the page.
pub type ControllerListener = Box<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Subscribe to controller changes. Listeners stay for the host's lifetime.
    fn on_controller_change(&self, listener: ControllerListener);

    /// Register the worker script at `script` (a path on the page origin).
    async fn register(&self, script: &str) -> Result<Arc<dyn Registration>>;

    /// Resolve once a registered worker is active and serving the page.
    async fn ready(&self) -> Result<()>;
}

/// Handle to a registered worker.
#[async_trait]
pub trait Registration: Send + Sync {
    /// Check for a newer version of the worker script.
    async fn update(&self) -> Result<()>;
}

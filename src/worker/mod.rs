//! Background worker controller.
//!
//! Installs the page-scoped worker that intermediates network traffic and
//! keeps it current:
//!
//! ```text
//! subscribe(controller change) -> register(script) -> ready -> installed = true
//!                                                               |
//!                                               every 60s: registration.update()
//! ```
//!
//! A controller change after `installed` means the worker replaced itself
//! mid-session; resources fetched under the old one may be stale, so the
//! developer is told to reload. The change seen during the first install is
//! expected and stays silent.

mod host;
mod http;

pub use host::{ControllerListener, Registration, WorkerHost};
pub use http::HttpWorkerHost;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::ReloadError;

pub const STALE_CONTROLLER_WARNING: &str = "service-worker updated. reload it.";

pub struct WorkerController {
    host: Option<Arc<dyn WorkerHost>>,
    script: String,
    update_interval: Duration,
    installed: Arc<AtomicBool>,
    stale_warnings: Arc<AtomicUsize>,
    update_timer: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerController {
    /// `host` is `None` when the environment has no worker capability.
    pub fn new(
        host: Option<Arc<dyn WorkerHost>>,
        script: impl Into<String>,
        update_interval: Duration,
    ) -> Self {
        Self {
            host,
            script: script.into(),
            update_interval,
            installed: Arc::new(AtomicBool::new(false)),
            stale_warnings: Arc::new(AtomicUsize::new(0)),
            update_timer: Mutex::new(None),
        }
    }

    /// Register the worker, wait until it serves the page, start update polling.
    pub async fn setup(&self) -> Result<(), ReloadError> {
        let host = self
            .host
            .as_ref()
            .ok_or(ReloadError::UnsupportedEnvironment)?;

        // Subscribe before registering: the first claim can fire during register()
        let installed = Arc::clone(&self.installed);
        let stale_warnings = Arc::clone(&self.stale_warnings);
        host.on_controller_change(Box::new(move || {
            if installed.load(Ordering::SeqCst) {
                stale_warnings.fetch_add(1, Ordering::SeqCst);
                crate::warn!("{}", STALE_CONTROLLER_WARNING);
            } else {
                crate::debug!("worker"; "worker took control");
            }
        }));

        let registration = host
            .register(&self.script)
            .await
            .map_err(ReloadError::Registration)?;
        host.ready().await.map_err(ReloadError::Registration)?;
        self.installed.store(true, Ordering::SeqCst);
        crate::debug!("worker"; "ready");

        let timer = tokio::spawn(poll_updates(registration, self.update_interval));
        if let Some(previous) = self.update_timer.lock().replace(timer) {
            previous.abort();
        }
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Number of mid-session takeovers reported to the developer.
    pub fn stale_warnings(&self) -> usize {
        self.stale_warnings.load(Ordering::SeqCst)
    }

    /// Stop update polling.
    pub fn shutdown(&self) {
        if let Some(timer) = self.update_timer.lock().take() {
            timer.abort();
        }
    }
}

impl Drop for WorkerController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fire-and-forget update checks; failures never leave this loop.
async fn poll_updates(registration: Arc<dyn Registration>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately; registration just happened
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = registration.update().await {
            crate::debug!("worker"; "update check failed: {:#}", e);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

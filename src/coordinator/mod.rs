//! Coordinator - wires the reload client together.
//!
//! # Responsibility
//!
//! The coordinator is a **thin orchestrator** that:
//! - Guards `start()` so it runs once per coordinator
//! - Sets up the worker before anything else touches the network
//! - Opens the command channel and spawns the dispatcher
//! - Performs the initial activation
//!
//! Reload semantics live in the components: `worker`, `revalidate`,
//! `runner` and `channel`.
//!
//! # Architecture
//!
//! ```text
//! start(url) ─► WorkerController::setup ─► Connector::connect ─► ModuleRunner::run
//!                                                 │
//!                                                 ▼
//!                            Dispatcher ─► Revalidator ─► ChangeHandler ─► ModuleRunner::run
//! ```

mod dispatch;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::channel::{ChannelLossPolicy, Connector, WsConnector};
use crate::config::{ClientConfig, ConfigError, LoaderKind};
use crate::core::{PageOrigin, RunId};
use crate::error::ReloadError;
use crate::revalidate::{RevalidateOutcome, Revalidator};
use crate::runner::{DylibLoader, ModuleLoader, ModuleRunner, ProcessLoader, RunOptions};
use crate::worker::{HttpWorkerHost, WorkerController, WorkerHost};
use dispatch::Dispatcher;

// ============================================================================
// Environment
// ============================================================================

/// Capabilities of the hosting environment.
pub struct Environment {
    /// `None` when the environment can not host a background worker
    pub worker_host: Option<Arc<dyn WorkerHost>>,
    pub connector: Arc<dyn Connector>,
    pub loader: Arc<dyn ModuleLoader>,
    pub http: reqwest::Client,
}

impl Environment {
    /// Worker over HTTP, WebSocket channel, loader chosen by `module.loader`.
    pub fn native(config: &ClientConfig) -> Result<Self, ConfigError> {
        let origin = config.origin()?;
        let http = reqwest::Client::new();

        let loader: Arc<dyn ModuleLoader> = match config.module.loader {
            LoaderKind::Dylib => Arc::new(DylibLoader::new(
                http.clone(),
                config.module.cache_dir.clone(),
                config.module.entry_symbol.clone(),
            )),
            LoaderKind::Process => Arc::new(ProcessLoader::new(config.module.command.clone(), None)),
        };

        Ok(Self {
            worker_host: Some(Arc::new(HttpWorkerHost::new(http.clone(), origin))),
            connector: Arc::new(WsConnector),
            loader,
            http,
        })
    }
}

// ============================================================================
// Options
// ============================================================================

/// What to do after a revalidation completed.
#[derive(Clone, Default)]
pub enum ChangeHandler {
    /// Re-run the module with the options `start` received.
    #[default]
    Rerun,
    /// Call this instead of re-running.
    Custom(Arc<dyn Fn() + Send + Sync>),
}

impl fmt::Debug for ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rerun => f.write_str("Rerun"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub nocache: bool,
    pub on_file_change: ChangeHandler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(RunId),
    /// `start` already ran on this coordinator; nothing was done.
    AlreadyStarted,
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct Coordinator {
    /// StartGuard: set before the first suspension point of `start`
    started: AtomicBool,
    stopped: AtomicBool,
    origin: PageOrigin,
    endpoint: String,
    loss_policy: ChannelLossPolicy,
    connector: Arc<dyn Connector>,
    controller: WorkerController,
    runner: Arc<ModuleRunner>,
    revalidator: Revalidator,
    shutdown: watch::Sender<bool>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(config: &ClientConfig, env: Environment) -> Result<Self, ConfigError> {
        let origin = config.origin()?;
        let revalidator = Revalidator::new(
            env.http,
            origin.clone(),
            &config.revalidate.endpoint,
            config.revalidate.timeout(),
        )
        .map_err(|e| ConfigError::Validation(format!("revalidate.endpoint: {e}")))?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            origin,
            endpoint: config.channel.endpoint.clone(),
            loss_policy: config.channel.loss_policy(),
            connector: env.connector,
            controller: WorkerController::new(
                env.worker_host,
                config.worker.script.clone(),
                config.worker.update_interval(),
            ),
            runner: Arc::new(ModuleRunner::new(env.loader)),
            revalidator,
            shutdown,
            dispatch: Mutex::new(None),
        })
    }

    /// Set up the worker, open the channel, activate the module at `url`.
    ///
    /// Runs once per coordinator; later calls return `AlreadyStarted`.
    pub async fn start(
        &self,
        url: &str,
        options: StartOptions,
    ) -> Result<StartOutcome, ReloadError> {
        if self.started.swap(true, Ordering::SeqCst) {
            crate::debug!("swdev"; "already started");
            return Ok(StartOutcome::AlreadyStarted);
        }
        crate::log!("swdev"; "start");

        let url = self
            .origin
            .resolve(url)
            .map_err(|e| ReloadError::module_load_failed(url, e))?;
        let run_options = RunOptions {
            nocache: options.nocache,
        };

        self.controller.setup().await?;

        match self.connector.connect(&self.endpoint).await {
            Ok(events) => {
                let dispatcher = Dispatcher {
                    runner: Arc::clone(&self.runner),
                    revalidator: self.revalidator.clone(),
                    connector: Arc::clone(&self.connector),
                    endpoint: self.endpoint.clone(),
                    policy: self.loss_policy.clone(),
                    url: url.clone(),
                    options: run_options,
                    handler: options.on_file_change,
                    shutdown: self.shutdown.subscribe(),
                };
                *self.dispatch.lock() = Some(tokio::spawn(dispatcher.run(events)));
            }
            Err(e) => crate::log!("channel"; "no socket: {}", e),
        }

        let run_id = self.runner.run(&url, run_options).await?;
        Ok(StartOutcome::Started(run_id))
    }

    /// Stop dispatching and update polling, then dispose the active module.
    ///
    /// Idempotent.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.send_replace(true);
        self.controller.shutdown();

        let task = self.dispatch.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            crate::debug!("channel"; "dispatcher ended abnormally: {}", e);
        }

        self.runner.dispose().await;
        crate::log!("swdev"; "stopped");
    }

    /// Ask the server to revalidate `paths` without going through the channel.
    pub async fn request_revalidate(&self, paths: &[String]) -> RevalidateOutcome {
        self.revalidator.request_revalidate(paths).await
    }

    /// Whether a dispatcher is still consuming the channel.
    pub fn is_dispatching(&self) -> bool {
        self.dispatch
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn runner(&self) -> &Arc<ModuleRunner> {
        &self.runner
    }

    pub fn controller(&self) -> &WorkerController {
        &self.controller
    }
}

//! Module runner.
//!
//! Owns the single current-instance slot. Every `run` disposes the previous
//! instance before the next one is loaded, under one async lock:
//!
//! ```text
//! run(url) ─► lock ─► take disposer ─► await dispose ─► load(url?run_id) ─► activate ─► store
//! ```
//!
//! The lock is held across every suspension point, so two overlapping runs
//! never interleave their dispose and activate steps.

mod disposer;
mod dylib;
mod loader;
mod process;

pub use disposer::Disposer;
pub use dylib::DylibLoader;
pub use loader::{Module, ModuleLoader};
pub use process::ProcessLoader;

use std::sync::Arc;

use tokio::sync::Mutex;
use url::Url;

use crate::core::RunId;
use crate::error::ReloadError;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub nocache: bool,
}

/// State of the current instance slot.
#[derive(Debug, Default)]
struct ModuleRunState {
    disposer: Option<Disposer>,
    run_id: Option<RunId>,
    /// Successful activations so far
    generation: u64,
}

pub struct ModuleRunner {
    loader: Arc<dyn ModuleLoader>,
    state: Mutex<ModuleRunState>,
}

impl ModuleRunner {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(ModuleRunState::default()),
        }
    }

    /// Replace the current instance with a fresh load of `url`.
    ///
    /// On failure the slot stays empty: the previous instance is already gone.
    pub async fn run(&self, url: &Url, options: RunOptions) -> Result<RunId, ReloadError> {
        let mut state = self.state.lock().await;

        let run_id = RunId::generate(options.nocache);
        crate::log!("run"; "run {}", run_id);

        state.run_id = None;
        if let Some(disposer) = state.disposer.take() {
            disposer.dispose().await;
        }

        let target = run_id.apply_to(url);
        let module = self
            .loader
            .load(&target)
            .await
            .map_err(|e| ReloadError::module_load_failed(target.as_str(), e))?;
        let disposer = module
            .activate()
            .map_err(|e| ReloadError::module_load_failed(target.as_str(), e))?;

        state.disposer = Some(disposer);
        state.generation += 1;
        state.run_id = Some(run_id.clone());
        Ok(run_id)
    }

    /// Dispose the current instance, if any.
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        state.run_id = None;
        if let Some(disposer) = state.disposer.take() {
            crate::debug!("run"; "disposing module");
            disposer.dispose().await;
        }
    }

    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    pub async fn current_run_id(&self) -> Option<RunId> {
        self.state.lock().await.run_id.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.disposer.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::time::Duration;

    /// Loader whose modules record `activate N` / `dispose N` into a shared log.
    #[derive(Default)]
    pub(crate) struct RecordingLoader {
        pub events: Arc<SyncMutex<Vec<String>>>,
        pub loaded: SyncMutex<Vec<String>>,
        pub fail_next: SyncMutex<bool>,
        pub dispose_delay: Option<Duration>,
    }

    impl RecordingLoader {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    #[async_trait]
    impl ModuleLoader for RecordingLoader {
        async fn load(&self, url: &Url) -> Result<Box<dyn Module>> {
            let index = {
                let mut loaded = self.loaded.lock();
                loaded.push(url.to_string());
                loaded.len()
            };
            if std::mem::take(&mut *self.fail_next.lock()) {
                anyhow::bail!("404 for {url}");
            }

            let events = Arc::clone(&self.events);
            let delay = self.dispose_delay;
            Ok(Box::new(move || -> Result<Disposer> {
                events.lock().push(format!("activate {index}"));
                Ok(Disposer::new(move || async move {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    events.lock().push(format!("dispose {index}"));
                }))
            }))
        }
    }

    fn url() -> Url {
        Url::parse("http://localhost:7777/app.so").unwrap()
    }

    #[tokio::test]
    async fn test_sequential_runs_dispose_previous_first() {
        let loader = Arc::new(RecordingLoader::default());
        let runner = ModuleRunner::new(loader.clone());

        for _ in 0..3 {
            runner.run(&url(), RunOptions::default()).await.unwrap();
        }

        assert_eq!(
            loader.events(),
            ["activate 1", "dispose 1", "activate 2", "dispose 2", "activate 3"]
        );
        assert_eq!(runner.generation().await, 3);
        assert!(runner.is_active().await);
    }

    #[tokio::test]
    async fn test_run_id_lands_in_query() {
        let loader = Arc::new(RecordingLoader::default());
        let runner = ModuleRunner::new(loader.clone());

        let run_id = runner
            .run(&url(), RunOptions { nocache: true })
            .await
            .unwrap();
        assert!(run_id.is_nocache());
        assert_eq!(runner.current_run_id().await, Some(run_id.clone()));
        assert_eq!(
            loader.loaded.lock()[0],
            format!("http://localhost:7777/app.so?{run_id}")
        );
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_interleave() {
        let loader = Arc::new(RecordingLoader {
            dispose_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let runner = Arc::new(ModuleRunner::new(loader.clone()));
        runner.run(&url(), RunOptions::default()).await.unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let runner = Arc::clone(&runner);
                tokio::spawn(async move { runner.run(&url(), RunOptions::default()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let events = loader.events();
        assert_eq!(events.len(), 9);
        // Strict alternation: every activation after the first follows a dispose
        for pair in events.chunks(2) {
            assert!(pair[0].starts_with("activate"));
            if let Some(next) = pair.get(1) {
                assert_eq!(next.replace("dispose", "activate"), pair[0]);
            }
        }
        assert_eq!(runner.generation().await, 5);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_slot_empty() {
        let loader = Arc::new(RecordingLoader::default());
        let runner = ModuleRunner::new(loader.clone());
        runner.run(&url(), RunOptions::default()).await.unwrap();

        *loader.fail_next.lock() = true;
        let err = runner.run(&url(), RunOptions::default()).await.unwrap_err();
        assert!(matches!(err, ReloadError::ModuleLoadFailed { .. }));

        assert!(!runner.is_active().await);
        assert_eq!(runner.current_run_id().await, None);
        assert_eq!(loader.events(), ["activate 1", "dispose 1"]);

        // Recovers on the next run
        runner.run(&url(), RunOptions::default()).await.unwrap();
        assert!(runner.is_active().await);
    }

    #[tokio::test]
    async fn test_failed_activation_is_a_load_failure() {
        struct Broken;

        #[async_trait]
        impl ModuleLoader for Broken {
            async fn load(&self, _url: &Url) -> Result<Box<dyn Module>> {
                Ok(Box::new(|| -> Result<Disposer> { anyhow::bail!("entry panicked") }))
            }
        }

        let runner = ModuleRunner::new(Arc::new(Broken));
        assert!(matches!(
            runner.run(&url(), RunOptions::default()).await,
            Err(ReloadError::ModuleLoadFailed { .. })
        ));
        assert_eq!(runner.generation().await, 0);
    }

    #[tokio::test]
    async fn test_dispose_runs_once() {
        let loader = Arc::new(RecordingLoader::default());
        let runner = ModuleRunner::new(loader.clone());
        runner.run(&url(), RunOptions::default()).await.unwrap();

        runner.dispose().await;
        runner.dispose().await;
        assert_eq!(loader.events(), ["activate 1", "dispose 1"]);
        assert!(!runner.is_active().await);
    }
}

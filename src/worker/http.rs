//! Worker host backed by the dev server's worker script.
//!
//! Registration fetches the script; the worker counts as active once that
//! succeeded. The script's blake3 fingerprint identifies the worker version:
//! the first activation and every fingerprint change seen by `update()` are
//! reported as controller changes.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use url::Url;

use super::host::{ControllerListener, Registration, WorkerHost};
use crate::core::PageOrigin;

/// State shared between the host and its registration handles
struct Shared {
    listeners: Mutex<Vec<ControllerListener>>,
    /// Fingerprint of the active script, `None` before the first activation
    fingerprint: Mutex<Option<String>>,
    active: watch::Sender<bool>,
}

impl Shared {
    /// Record a fetched script. Returns true when it differs from the active one.
    fn activate(&self, script: &[u8]) -> bool {
        let fingerprint = hex::encode(blake3::hash(script).as_bytes());
        let mut current = self.fingerprint.lock();
        if current.as_deref() == Some(fingerprint.as_str()) {
            return false;
        }
        *current = Some(fingerprint);
        true
    }

    fn notify(&self) {
        for listener in self.listeners.lock().iter() {
            listener();
        }
    }
}

pub struct HttpWorkerHost {
    client: reqwest::Client,
    origin: PageOrigin,
    shared: Arc<Shared>,
}

impl HttpWorkerHost {
    pub fn new(client: reqwest::Client, origin: PageOrigin) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            client,
            origin,
            shared: Arc::new(Shared {
                listeners: Mutex::new(Vec::new()),
                fingerprint: Mutex::new(None),
                active,
            }),
        }
    }
}

#[async_trait]
impl WorkerHost for HttpWorkerHost {
    fn on_controller_change(&self, listener: ControllerListener) {
        self.shared.listeners.lock().push(listener);
    }

    async fn register(&self, script: &str) -> Result<Arc<dyn Registration>> {
        let url = self
            .origin
            .resolve(script)
            .with_context(|| format!("invalid worker script path `{script}`"))?;

        let body = fetch_script(&self.client, &url).await?;
        if self.shared.activate(&body) {
            self.shared.active.send_replace(true);
            self.shared.notify();
        }
        crate::debug!("worker"; "registered {}", url);

        Ok(Arc::new(HttpRegistration {
            client: self.client.clone(),
            url,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn ready(&self) -> Result<()> {
        let mut active = self.shared.active.subscribe();
        active
            .wait_for(|active| *active)
            .await
            .context("worker host dropped before activation")?;
        Ok(())
    }
}

struct HttpRegistration {
    client: reqwest::Client,
    url: Url,
    shared: Arc<Shared>,
}

#[async_trait]
impl Registration for HttpRegistration {
    async fn update(&self) -> Result<()> {
        let body = fetch_script(&self.client, &self.url).await?;
        if self.shared.activate(&body) {
            crate::debug!("worker"; "new worker version at {}", self.url);
            self.shared.notify();
        }
        Ok(())
    }
}

async fn fetch_script(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("failed to fetch worker script {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("worker script {url} returned {status}");
    }
    Ok(response.bytes().await?.to_vec())
}

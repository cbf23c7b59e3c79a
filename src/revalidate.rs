//! Revalidation requests.
//!
//! Tells the dev server which resources changed so the worker layer drops
//! its cached responses. Best-effort: one POST, no retry, never an error for
//! the caller.
//!
//! ```text
//! POST {origin}/__swdev/revalidate
//! Content-Type: application/json
//!
//! {"paths": ["https://dev.local:3000/a.js", "https://x/b.js"]}
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::core::PageOrigin;
use crate::error::ReloadError;

#[derive(Debug, Serialize)]
struct RevalidateBody<'a> {
    paths: &'a [String],
}

/// What happened to a revalidation request. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidateOutcome {
    Requested,
    /// Server answered with a non-success status
    Rejected(u16),
    /// Request never got a response
    Failed(String),
}

#[derive(Clone)]
pub struct Revalidator {
    client: reqwest::Client,
    origin: PageOrigin,
    endpoint: Url,
    timeout: Duration,
}

impl Revalidator {
    pub fn new(
        client: reqwest::Client,
        origin: PageOrigin,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let endpoint = origin.resolve(endpoint)?;
        Ok(Self {
            client,
            origin,
            endpoint,
            timeout,
        })
    }

    /// `/`-relative paths become absolute URLs on the page origin.
    pub fn absolutize(&self, paths: &[String]) -> Vec<String> {
        paths.iter().map(|p| self.origin.absolutize(p)).collect()
    }

    /// Send one revalidation request and wait for its response.
    ///
    /// Never fails: non-success statuses and network errors are logged.
    pub async fn request_revalidate(&self, paths: &[String]) -> RevalidateOutcome {
        let paths = self.absolutize(paths);

        match self.send(&paths).await {
            Ok(status) if status.is_success() => {
                crate::log!("revalidate"; "revalidate-requested {:?}", paths);
                RevalidateOutcome::Requested
            }
            Ok(status) => {
                crate::log!("revalidate"; "revalidate {:?} ({})", paths, status);
                RevalidateOutcome::Rejected(status.as_u16())
            }
            Err(e) => {
                crate::log!("revalidate"; "{}", e);
                RevalidateOutcome::Failed(e.to_string())
            }
        }
    }

    /// Detached variant: the caller does not wait for the server.
    pub fn spawn_revalidate(&self, paths: Vec<String>) -> JoinHandle<RevalidateOutcome> {
        let revalidator = self.clone();
        tokio::spawn(async move { revalidator.request_revalidate(&paths).await })
    }

    async fn send(&self, paths: &[String]) -> Result<reqwest::StatusCode, ReloadError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&RevalidateBody { paths })
            .send()
            .await
            .map_err(|e| ReloadError::RevalidationFailed(e.to_string()))?;
        Ok(response.status())
    }
}

// =============================================================================
// Tests
// =============================================================================

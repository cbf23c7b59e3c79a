//! Module loading seam.
//!
//! A loader turns an address into a `Module`; activating the module runs its
//! entry point and yields the disposer for that instance.

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::Disposer;

/// A loaded, not yet activated module instance.
pub trait Module: Send {
    /// Run the module's entry point. Consumes the module: one activation per load.
    fn activate(self: Box<Self>) -> Result<Disposer>;
}

impl<F> Module for F
where
    F: FnOnce() -> Result<Disposer> + Send,
{
    fn activate(self: Box<Self>) -> Result<Disposer> {
        (*self)()
    }
}

#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `url` (run id already in the query).
    async fn load(&self, url: &Url) -> Result<Box<dyn Module>>;
}

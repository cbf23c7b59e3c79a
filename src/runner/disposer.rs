//! Disposer: the one-shot cleanup an activated module hands back.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

type DisposeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct Disposer(Box<dyn FnOnce() -> DisposeFuture + Send>);

impl Disposer {
    /// Asynchronous cleanup.
    pub fn new<F, Fut>(dispose: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Box::new(move || Box::pin(dispose())))
    }

    /// Synchronous cleanup.
    pub fn from_fn<F>(dispose: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(move || async move { dispose() })
    }

    /// For modules that return nothing to clean up.
    pub fn noop() -> Self {
        Self::new(|| async {})
    }

    /// Run the cleanup to completion.
    pub async fn dispose(self) {
        (self.0)().await
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Disposer")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_sync_and_async_disposers_run() {
        let sync_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&sync_ran);
        Disposer::from_fn(move || flag.store(true, Ordering::SeqCst))
            .dispose()
            .await;
        assert!(sync_ran.load(Ordering::SeqCst));

        let async_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&async_ran);
        Disposer::new(move || async move {
            tokio::task::yield_now().await;
            flag.store(true, Ordering::SeqCst);
        })
        .dispose()
        .await;
        assert!(async_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_noop_disposer() {
        Disposer::noop().dispose().await;
    }
}

//! Dynamic library loader.
//!
//! Each run writes the library to its own file in the cache directory. The
//! file name carries a hash of the full address (run id included), so a
//! reload never reopens a path the dynamic linker already has mapped.
//!
//! Module contract:
//!
//! ```c
//! /* returns an optional dispose function, NULL for none */
//! void (*swdev_main(void))(void);
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use libloading::{Library, Symbol};
use url::Url;

use super::{Disposer, Module, ModuleLoader};

type DisposeFn = unsafe extern "C" fn();
type EntryFn = unsafe extern "C" fn() -> Option<DisposeFn>;

pub struct DylibLoader {
    http: reqwest::Client,
    cache_dir: PathBuf,
    entry_symbol: String,
}

impl DylibLoader {
    pub fn new(
        http: reqwest::Client,
        cache_dir: impl Into<PathBuf>,
        entry_symbol: impl Into<String>,
    ) -> Self {
        Self {
            http,
            cache_dir: cache_dir.into(),
            entry_symbol: entry_symbol.into(),
        }
    }

    /// Per-run file name: `{stem}-{hash}.{so|dylib|dll}`.
    ///
    /// The stem drops every extension, so `libapp.so.1` becomes `libapp`.
    fn library_path(&self, url: &Url) -> PathBuf {
        let stem = Path::new(url.path())
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.split('.').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("module");
        let hash = blake3::hash(url.as_str().as_bytes()).to_hex();
        self.cache_dir.join(format!(
            "{stem}-{}.{}",
            &hash[..16],
            std::env::consts::DLL_EXTENSION
        ))
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| anyhow!("invalid file url `{url}`"))?;
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))
            }
            "http" | "https" => {
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("failed to fetch `{url}`"))?;
                Ok(response.bytes().await?.to_vec())
            }
            scheme => Err(anyhow!("unsupported module scheme `{scheme}`")),
        }
    }
}

#[async_trait]
impl ModuleLoader for DylibLoader {
    async fn load(&self, url: &Url) -> Result<Box<dyn Module>> {
        let bytes = self.fetch(url).await?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("failed to create {}", self.cache_dir.display()))?;
        let path = self.library_path(url);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        let lib_path = path.clone();
        let opened = tokio::task::spawn_blocking(move || {
            // SAFETY: Opening a library runs its initializers; the module is trusted dev code.
            unsafe { Library::new(&lib_path) }
                .with_context(|| format!("failed to load library {}", lib_path.display()))
        })
        .await
        .context("library loader task panicked")?;

        let library = match opened {
            Ok(library) => library,
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };

        crate::debug!("run"; "opened {}", path.display());
        Ok(Box::new(DylibModule {
            library,
            path,
            entry_symbol: self.entry_symbol.clone(),
        }))
    }
}

struct DylibModule {
    library: Library,
    path: PathBuf,
    entry_symbol: String,
}

impl Module for DylibModule {
    fn activate(self: Box<Self>) -> Result<Disposer> {
        let Self {
            library,
            path,
            entry_symbol,
        } = *self;

        let dispose = match call_entry(&library, &entry_symbol) {
            Ok(dispose) => dispose,
            Err(e) => {
                drop(library);
                let _ = std::fs::remove_file(&path);
                return Err(e.context(format!("failed to activate {}", path.display())));
            }
        };

        Ok(Disposer::from_fn(move || {
            if let Some(dispose) = dispose {
                // SAFETY: Returned by the entry point; valid while the library stays loaded.
                unsafe { dispose() };
            }
            drop(library);
            if let Err(e) = std::fs::remove_file(&path) {
                crate::debug!("run"; "failed to remove {}: {}", path.display(), e);
            }
        }))
    }
}

/// Run the entry point, returning its optional dispose function.
fn call_entry(library: &Library, entry_symbol: &str) -> Result<Option<DisposeFn>> {
    // SAFETY: Symbol type matches the module ABI contract.
    let entry: Symbol<EntryFn> = unsafe {
        library
            .get(entry_symbol.as_bytes())
            .with_context(|| format!("missing entry symbol `{entry_symbol}`"))?
    };
    // SAFETY: The entry point is trusted by ABI contract and takes no arguments.
    Ok(unsafe { entry() })
}

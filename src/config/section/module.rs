//! `[module]` section configuration.
//!
//! ```toml
//! [module]
//! url = "/app.so"                  # module address (relative to page.origin)
//! loader = "dylib"                 # "dylib" or "process"
//! entry_symbol = "swdev_main"      # dylib entry point
//! cache_dir = ".swdev/modules"     # where downloaded libraries are written
//! command = ["./target/debug/app"] # process loader command line
//! nocache = false                  # prefix run ids with `nocache-`
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a module address is turned into a running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Open a dynamic library and call its entry symbol.
    Dylib,
    /// Spawn an external command, kill it on dispose.
    Process,
}

/// Module loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Default module address when none is given on the command line.
    pub url: Option<String>,
    pub loader: LoaderKind,
    pub entry_symbol: String,
    pub cache_dir: PathBuf,
    pub command: Vec<String>,
    pub nocache: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            url: None,
            loader: LoaderKind::Dylib,
            entry_symbol: "swdev_main".into(),
            cache_dir: PathBuf::from(".swdev/modules"),
            command: Vec::new(),
            nocache: false,
        }
    }
}

//! Client configuration management for `swdev.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One file per TOML section
//! ├── error          # ConfigError
//! ├── util           # Config file discovery
//! └── mod.rs         # ClientConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section          | Purpose                                       |
//! |------------------|-----------------------------------------------|
//! | `[page]`         | Origin of the page (dev server)               |
//! | `[worker]`       | Worker script registration and update polling |
//! | `[channel]`      | Command channel endpoint and loss policy      |
//! | `[revalidate]`   | Revalidation endpoint                         |
//! | `[module]`       | Module loader                                 |
//!
//! A missing config file is not an error: every section has defaults
//! matching the dev server's well-known paths.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{
    ChannelConfig, LoaderKind, ModuleConfig, PageConfig, RevalidateConfig, WorkerConfig,
};

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::core::PageOrigin;
use crate::log;
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing swdev.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Absolute path of the loaded config file, if one was found
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub revalidate: RevalidateConfig,

    #[serde(default)]
    pub module: ModuleConfig,
}

impl ClientConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file, falls back to defaults
    /// when there is none, then applies CLI overrides and validates.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("swdev"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {} ignored: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Parsed page origin. Only valid after `validate()`.
    pub fn origin(&self) -> Result<PageOrigin, ConfigError> {
        PageOrigin::parse(&self.page.origin)
            .map_err(|e| ConfigError::Validation(format!("page.origin: {e}")))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    pub fn apply_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Start {
                url,
                nocache,
                loader,
                origin,
            } => {
                if url.is_some() {
                    self.module.url = url.clone();
                }
                Self::update_option(&mut self.module.loader, loader.as_ref());
                Self::update_option(&mut self.page.origin, origin.as_ref());
                self.module.nocache |= *nocache;
            }
            Commands::Revalidate { origin, .. } => {
                Self::update_option(&mut self.page.origin, origin.as_ref());
            }
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate field values, collecting every problem into one error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.origin() {
            errors.push(e.to_string());
        }
        if !self.worker.script.starts_with('/') {
            errors.push("worker.script must start with `/`".to_string());
        }
        if self.worker.update_interval_secs == 0 {
            errors.push("worker.update_interval_secs must be greater than 0".to_string());
        }
        match url::Url::parse(&self.channel.endpoint) {
            Ok(endpoint) if matches!(endpoint.scheme(), "ws" | "wss") => {}
            Ok(endpoint) => errors.push(format!(
                "channel.endpoint must use ws:// or wss://, got `{}://`",
                endpoint.scheme()
            )),
            Err(e) => errors.push(format!("channel.endpoint: {e}")),
        }
        if !self.revalidate.endpoint.starts_with('/') {
            errors.push("revalidate.endpoint must start with `/`".to_string());
        }
        if self.module.loader == LoaderKind::Process && self.module.command.is_empty() {
            errors.push("module.command is required when module.loader = \"process\"".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

/// Parse a config snippet for section tests, rejecting unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ClientConfig {
    let (parsed, ignored) = ClientConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

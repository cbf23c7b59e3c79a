//! External command execution.
//!
//! Builder for long-running child processes. Children are spawned on the
//! tokio runtime and killed when their handle is dropped.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let child = Cmd::new("./target/debug/app")
//!     .args(["--port", "8080"])
//!     .cwd(root)
//!     .envs([("SWDEV_RUN_ID", run_id.as_str())])
//!     .spawn()?;
//! ```

use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Clone, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Spawn the command with inherited stdio.
    ///
    /// The child is killed if the returned handle is dropped before it exits.
    pub fn spawn(self) -> Result<Child> {
        let name = self.program_name();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        cmd.spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))
    }
}

// ============================================================================
// Argument Resolution
// ============================================================================

/// Replace `$NAME` occurrences in `args` with values from `vars`.
pub fn resolve_args(args: &[String], vars: &BTreeMap<&str, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            // Reverse order visits `$A_B` before its prefix `$A`
            for (key, value) in vars.iter().rev() {
                result = result.replace(&format!("${key}"), value);
            }
            result
        })
        .collect()
}

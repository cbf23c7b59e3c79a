//! Process respawn loader.
//!
//! The module is an external command. Activation spawns it; disposal kills
//! it and waits for the exit. The address and run id reach the child through
//! its environment and through `$SWDEV_*` placeholders in the command line.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use url::Url;

use super::{Disposer, Module, ModuleLoader};
use crate::utils::exec::{Cmd, resolve_args};

pub const MODULE_URL_VAR: &str = "SWDEV_MODULE_URL";
pub const RUN_ID_VAR: &str = "SWDEV_RUN_ID";

pub struct ProcessLoader {
    command: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessLoader {
    pub fn new(command: Vec<String>, cwd: Option<PathBuf>) -> Self {
        Self { command, cwd }
    }
}

#[async_trait]
impl ModuleLoader for ProcessLoader {
    async fn load(&self, url: &Url) -> Result<Box<dyn Module>> {
        let Some(program) = self.command.first() else {
            return Err(anyhow!("no module command configured"));
        };
        let program = which::which(program)
            .map_err(|e| anyhow!("module command `{program}` not found: {e}"))?;

        // The run id is the last query component
        let run_id = url
            .query()
            .and_then(|q| q.rsplit('&').next())
            .unwrap_or_default()
            .to_string();
        let vars = BTreeMap::from([
            (MODULE_URL_VAR, url.to_string()),
            (RUN_ID_VAR, run_id),
        ]);

        let mut cmd = Cmd::new(program)
            .args(resolve_args(&self.command[1..], &vars))
            .envs(vars);
        if let Some(cwd) = &self.cwd {
            cmd = cmd.cwd(cwd);
        }
        Ok(Box::new(ProcessModule { cmd }))
    }
}

struct ProcessModule {
    cmd: Cmd,
}

impl Module for ProcessModule {
    fn activate(self: Box<Self>) -> Result<Disposer> {
        let name = self.cmd.program_name();
        let mut child = self.cmd.spawn()?;
        crate::debug!("run"; "spawned `{}` (pid {:?})", name, child.id());

        Ok(Disposer::new(move || async move {
            if let Err(e) = child.start_kill() {
                crate::debug!("run"; "`{}` already gone: {}", name, e);
            }
            match child.wait().await {
                Ok(status) => crate::debug!("run"; "`{}` exited: {}", name, status),
                Err(e) => crate::debug!("run"; "failed to wait for `{}`: {}", name, e),
            }
        }))
    }
}

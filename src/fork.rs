// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use nix::unistd::setsid;
use tokio::fs::OpenOptions;
use tokio::process::Command;
use tracing::debug;

use crate::env::RuntimeEnv;
use crate::procs::LaunchSpec;
use crate::Error;

pub struct StdIoConf {
    pub stdin: Stdio,
    pub stderr: Stdio,
    pub stdout: Stdio,
}

impl StdIoConf {
    /// No input, stdout and stderr both go to `log_file`, which is truncated first
    pub async fn redirect_to(log_file: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file)
            .await
            .map_err(|e| Error::at_path(log_file, e))?
            .into_std()
            .await;

        let err_file = file.try_clone().map_err(|e| Error::at_path(log_file, e))?;

        Ok(Self {
            stdin: Stdio::null(),
            stderr: Stdio::from(err_file),
            stdout: Stdio::from(file),
        })
    }
}

/// Starts a component and hands back its pid without waiting on it
#[async_trait]
pub trait Spawner: Send + Sync {
    async fn spawn(&self, spec: &LaunchSpec, env: &RuntimeEnv) -> Result<u32, Error>;
}

/// Spawns each component into its own session, fully detached from the launcher
///
/// The child handle is dropped right after the spawn, nothing ever waits on it.
#[derive(Clone, Debug)]
pub struct Detached {
    working_dir: PathBuf,
}

impl Detached {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl Spawner for Detached {
    async fn spawn(&self, spec: &LaunchSpec, env: &RuntimeEnv) -> Result<u32, Error> {
        let stdio = StdIoConf::redirect_to(&spec.log_file).await?;

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&self.working_dir)
            .kill_on_drop(false)
            .stdin(stdio.stdin)
            .stdout(stdio.stdout)
            .stderr(stdio.stderr);

        env.apply(&mut command);
        command.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        // This is safe since setsid is async-signal-safe and touches no memory of the parent
        unsafe {
            command.pre_exec(|| setsid().map(drop).map_err(io::Error::from));
        }

        let child = command
            .spawn()
            .map_err(|e| Error::from(format!("failed to spawn {}: {}", spec.program, e)))?;

        let pid = child
            .id()
            .ok_or_else(|| Error::from("child exited before its pid was read"))?;

        debug!(
            "started {} (pid {}): {} > {}",
            spec.name,
            pid,
            spec.display_command(),
            spec.log_file.display()
        );

        drop(child);
        Ok(pid)
    }
}

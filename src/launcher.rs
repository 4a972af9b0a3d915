// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fmt;
use std::fs;

use tokio::time;
use tracing::{info, warn};

use crate::config::Settings;
use crate::env::RuntimeEnv;
use crate::fork::Spawner;
use crate::journal::StartupLog;
use crate::procs::LaunchSpec;
use crate::Error;

/// Final line of every run, written whatever happened to the launches
pub const ALL_STARTED: &str = "Alle Komponenten gestartet";

pub fn starting_message(label: &str) -> String {
    format!("Starte {}...", label)
}

/// What the launcher knows about a component after starting it, which is not much
#[derive(Debug)]
pub struct LaunchRecord {
    pub name: String,
    pub label: String,
    /// pid of the child, or why it could not be spawned
    pub outcome: Result<u32, String>,
}

#[derive(Debug, Default)]
pub struct LaunchReport {
    pub records: Vec<LaunchRecord>,
}

impl LaunchReport {
    pub fn spawned(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_ok()).count()
    }

    /// One line count followed by the per-component table
    pub fn summary(&self) -> String {
        format!(
            "{} of {} components spawned\n{}",
            self.spawned(),
            self.records.len(),
            self
        )
    }
}

impl fmt::Display for LaunchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            match &record.outcome {
                Ok(pid) => writeln!(f, "{:<20} pid {}", record.label, pid)?,
                Err(e) => writeln!(f, "{:<20} not started: {}", record.label, e)?,
            }
        }
        Ok(())
    }
}

/// Launch components one after the other
///
/// Rules:
/// - components start in the order given, each after the previous one's settle time
/// - nothing is awaited or checked after a spawn
/// - a failed spawn never stops the sequence
pub struct Launcher<S: Spawner> {
    spawner: S,
    env: RuntimeEnv,
    log: StartupLog,
}

impl<S: Spawner> Launcher<S> {
    pub fn new(spawner: S, env: RuntimeEnv, log: StartupLog) -> Self {
        Self { spawner, env, log }
    }

    /// Start one component, returns immediately after the spawn
    pub async fn launch(&self, spec: &LaunchSpec) -> LaunchRecord {
        let outcome = match self.spawner.spawn(spec, &self.env).await {
            Ok(pid) => {
                info!("{} started with pid {}", spec.name, pid);
                Ok(pid)
            }
            Err(e) => {
                warn!("{} could not be started: {}", spec.name, e);
                Err(e.to_string())
            }
        };

        LaunchRecord {
            name: spec.name.clone(),
            label: spec.label.clone(),
            outcome,
        }
    }

    /// Run the fixed sequence: log, launch, settle, for each component, then the final line
    pub async fn run(mut self, components: &[LaunchSpec]) -> LaunchReport {
        let mut report = LaunchReport::default();

        for spec in components {
            self.log.log(&starting_message(&spec.label));
            report.records.push(self.launch(spec).await);

            if !spec.settle.is_zero() {
                time::sleep(spec.settle).await;
            }
        }

        self.log.log(ALL_STARTED);
        report
    }
}

/// Everything the launcher does, from activating the runtime to the final line
///
/// Only an unusable startup log is fatal, everything after that is best effort.
pub async fn start<S: Spawner>(settings: &Settings, spawner: S) -> Result<LaunchReport, Error> {
    start_with_log(settings, spawner, StartupLog::open(&settings.startup_log)?).await
}

pub async fn start_with_log<S: Spawner>(
    settings: &Settings,
    spawner: S,
    log: StartupLog,
) -> Result<LaunchReport, Error> {
    if let Err(e) = fs::create_dir_all(&settings.log_dir) {
        warn!(
            "could not create log directory {}: {}",
            settings.log_dir.display(),
            e
        );
    }

    // credentials only reach a component through its own launch spec
    let env = RuntimeEnv::activate(&settings.activate).hiding(settings.credentials.secret_vars());
    let launcher = Launcher::new(spawner, env, log);

    Ok(launcher.run(&settings.components).await)
}

// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Read-only check of which components are currently running
//!
//! The launcher keeps no handles, so the only way to find the components again is to look for
//! their command lines in the process table.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::procs::LaunchSpec;
use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub cmdline: Vec<String>,
}

/// Source of the processes currently alive
pub trait ProcessTable {
    fn processes(&self) -> Result<Vec<ProcessInfo>, Error>;
}

/// Process table read from a procfs mount
#[derive(Clone, Debug)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_process(dir: &Path, pid: u32) -> io::Result<Option<ProcessInfo>> {
        // zombies keep their pid but are not running anymore
        if let Ok(stat) = fs::read_to_string(dir.join("stat")) {
            if process_state(&stat) == Some('Z') {
                return Ok(None);
            }
        }

        let raw = fs::read(dir.join("cmdline"))?;
        let cmdline: Vec<String> = raw
            .split(|b| *b == 0)
            .filter(|arg| !arg.is_empty())
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();

        // kernel threads have no command line
        if cmdline.is_empty() {
            return Ok(None);
        }

        Ok(Some(ProcessInfo { pid, cmdline }))
    }
}

impl ProcessTable for ProcFs {
    fn processes(&self) -> Result<Vec<ProcessInfo>, Error> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::at_path(&self.root, e))?;

        let mut processes = Vec::new();
        for entry in entries {
            let entry = entry?;
            let pid = match entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                Some(pid) => pid,
                None => continue,
            };

            // processes may exit while the table is walked
            match Self::read_process(&entry.path(), pid) {
                Ok(Some(info)) => processes.push(info),
                Ok(None) => (),
                Err(e) => trace!("skipping pid {}: {}", pid, e),
            }
        }

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }
}

/// State letter from `/proc/<pid>/stat`, which follows the parenthesized command name
fn process_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.trim_start().chars().next()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentState {
    Running(u32),
    NotRunning,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentState::Running(pid) => write!(f, "running (pid {})", pid),
            ComponentState::NotRunning => f.write_str("not running"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentStatus {
    pub name: String,
    pub label: String,
    pub state: ComponentState,
}

/// A process runs a component when every argument of the component shows up in its command line
///
/// Arguments may appear with a leading directory, `python /srv/run_collector.py` matches
/// `run_collector.py`. Without arguments the program name itself is matched.
fn matches(spec: &LaunchSpec, cmdline: &[String]) -> bool {
    let same = |needle: &str, arg: &String| {
        arg == needle || Path::new(arg).file_name().and_then(|n| n.to_str()) == Some(needle)
    };

    if spec.args.is_empty() {
        return cmdline
            .first()
            .map_or(false, |program| same(spec.program.as_str(), program));
    }

    spec.args
        .iter()
        .all(|needle| cmdline.iter().any(|arg| same(needle.as_str(), arg)))
}

/// Look up each component in the process table, the calling process is never reported
pub fn check<T: ProcessTable>(
    components: &[LaunchSpec],
    table: &T,
) -> Result<Vec<ComponentStatus>, Error> {
    let own_pid = std::process::id();
    let processes = table.processes()?;

    Ok(components
        .iter()
        .map(|spec| {
            let state = processes
                .iter()
                .filter(|p| p.pid != own_pid)
                .find(|p| matches(spec, &p.cmdline))
                .map_or(ComponentState::NotRunning, |p| ComponentState::Running(p.pid));

            ComponentStatus {
                name: spec.name.clone(),
                label: spec.label.clone(),
                state,
            }
        })
        .collect())
}

/// One printable line per component, an unreadable process table marks all of them unknown
pub fn status_lines<T: ProcessTable>(components: &[LaunchSpec], table: &T) -> Vec<String> {
    match check(components, table) {
        Ok(statuses) => statuses
            .iter()
            .map(|s| format!("{:<20} {}", s.label, s.state))
            .collect(),
        Err(e) => {
            warn!("cannot read the process table: {}", e);
            components
                .iter()
                .map(|s| format!("{:<20} unknown", s.label))
                .collect()
        }
    }
}

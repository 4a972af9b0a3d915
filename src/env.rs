// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Runtime environment activation
//!
//! An activation script only makes sense when sourced into a shell, so instead of sourcing it the
//! launcher applies the same changes to every child it starts: `VIRTUAL_ENV` points at the
//! environment, its `bin` directory goes first on `PATH` and `PYTHONHOME` is removed.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
const PATH: &str = "PATH";
const PYTHONHOME: &str = "PYTHONHOME";

/// Environment changes applied to each launched component
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeEnv {
    root: Option<PathBuf>,
    path: Option<OsString>,
    /// Variables no child inherits from the launcher
    hidden: Vec<String>,
}

impl RuntimeEnv {
    /// Children inherit the launcher's environment untouched
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Activate the environment described by the activation script at `script`
    ///
    /// A missing script is not an error, the children then run with the inherited environment.
    pub fn activate(script: &Path) -> Self {
        Self::activate_with_path(script, env::var_os(PATH))
    }

    pub(crate) fn activate_with_path(script: &Path, current_path: Option<OsString>) -> Self {
        let contents = match fs::read_to_string(script) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    "activation script {} not usable, continuing without it: {}",
                    script.display(),
                    e
                );
                return Self::inherit();
            }
        };

        let root = match declared_root(&contents) {
            Some(root) => root,
            // <root>/bin/activate
            None => match script.parent().and_then(Path::parent) {
                Some(root) => root.to_path_buf(),
                None => {
                    warn!("cannot locate environment for {}", script.display());
                    return Self::inherit();
                }
            },
        };

        let mut paths = vec![root.join("bin")];
        if let Some(current) = current_path {
            paths.extend(env::split_paths(&current));
        }

        let path = match env::join_paths(paths) {
            Ok(path) => path,
            Err(e) => {
                warn!("cannot extend PATH with {}: {}", root.display(), e);
                return Self::inherit();
            }
        };

        debug!("activated runtime environment at {}", root.display());
        Self {
            root: Some(root),
            path: Some(path),
            hidden: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The `PATH` children will see, `None` when inherited
    pub fn search_path(&self) -> Option<&OsString> {
        self.path.as_ref()
    }

    /// Keep `vars` out of every child, a launch spec may still set them explicitly
    pub fn hiding<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for var in vars {
            let var = var.into();
            if !self.hidden.contains(&var) {
                self.hidden.push(var);
            }
        }
        self
    }

    pub fn hidden(&self) -> &[String] {
        &self.hidden
    }

    pub fn apply(&self, command: &mut Command) {
        for var in &self.hidden {
            command.env_remove(var);
        }

        if let (Some(root), Some(path)) = (&self.root, &self.path) {
            command
                .env(VIRTUAL_ENV, root)
                .env(PATH, path)
                .env_remove(PYTHONHOME);
        }
    }
}

/// The `VIRTUAL_ENV=...` assignment of a virtualenv activation script
///
/// Only literal absolute paths are taken, anything computed by the shell is ignored.
fn declared_root(script: &str) -> Option<PathBuf> {
    script.lines().find_map(|line| {
        let line = line.trim();
        let line = line.strip_prefix("export ").unwrap_or(line);
        let value = line.strip_prefix("VIRTUAL_ENV=")?.trim();

        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);

        if value.contains('$') || value.contains('`') || !value.starts_with('/') {
            return None;
        }

        Some(PathBuf::from(value))
    })
}

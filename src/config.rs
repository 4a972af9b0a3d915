// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Launcher settings
//!
//! Built-in defaults reproduce the fixed startup sequence, an optional `signalrc.toml` in the
//! base directory may override paths and individual components. The order of the components
//! is not configurable.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::procs::{self, Component, Credentials, LaunchSpec, Maintenance};
use crate::Error;

/// Environment variable that overrides the base directory
pub const HOME_VAR: &str = "SIGNALRC_HOME";
/// Configuration file looked up in the base directory
pub const CONFIG_FILE: &str = "signalrc.toml";

pub const DEFAULT_ACTIVATE: &str = "trading_env/bin/activate";
pub const DEFAULT_STARTUP_LOG: &str = "startup.log";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Determine the directory all relative paths are anchored to
///
/// In order: the explicit argument, `SIGNALRC_HOME`, then the directory of the running executable.
pub fn resolve_base_directory(explicit: Option<&OsStr>) -> Result<PathBuf, Error> {
    let candidate = match explicit {
        Some(dir) => PathBuf::from(dir),
        None => match env::var_os(HOME_VAR).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let exe = env::current_exe()?;
                exe.parent()
                    .map(Path::to_path_buf)
                    .ok_or("executable has no parent directory")?
            }
        },
    };

    candidate
        .canonicalize()
        .map_err(|e| Error::at_path(candidate, e))
}

/// Read `<base_dir>/.env` without touching the launcher's own environment
///
/// A missing file yields nothing, a malformed one is skipped with a warning.
pub fn read_dotenv(base_dir: &Path) -> HashMap<String, String> {
    let path = base_dir.join(".env");
    let iter = match dotenvy::from_path_iter(&path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            warn!("ignoring {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                return HashMap::new();
            }
        }
    }

    debug!("read {} variables from {}", vars.len(), path.display());
    vars
}

/// Overrides for a single component
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ComponentOverride {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub log_file: Option<PathBuf>,
    pub settle_secs: Option<f64>,
}

/// Names of the variables the maintenance credentials are read from
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct CredentialVars {
    pub email_var: String,
    pub password_var: String,
}

impl CredentialVars {
    /// Every variable that may carry a credential, none of them is inherited by a component
    pub fn secret_vars(&self) -> Vec<String> {
        let mut vars = vec![
            self.email_var.clone(),
            self.password_var.clone(),
            Maintenance::EMAIL_VAR.to_string(),
            Maintenance::PASSWORD_VAR.to_string(),
        ];
        vars.sort();
        vars.dedup();
        vars
    }
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            email_var: Maintenance::EMAIL_VAR.to_string(),
            password_var: Maintenance::PASSWORD_VAR.to_string(),
        }
    }
}

/// On-disk representation of `signalrc.toml`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub activate: Option<PathBuf>,
    pub startup_log: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentOverride>,
    #[serde(default)]
    pub credentials: CredentialVars,
}

impl ConfigFile {
    pub fn parse(contents: &str) -> Result<Self, Error> {
        Ok(toml::from_str(contents)?)
    }
}

/// Fully resolved settings, every path absolute
#[derive(Clone, Debug)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub activate: PathBuf,
    pub startup_log: PathBuf,
    pub log_dir: PathBuf,
    pub components: Vec<LaunchSpec>,
    pub credentials: CredentialVars,
}

impl Settings {
    /// Settings equivalent to the original fixed startup sequence
    pub fn defaults(base_dir: &Path) -> Self {
        let log_dir = base_dir.join(DEFAULT_LOG_DIR);

        Self {
            base_dir: base_dir.to_path_buf(),
            activate: base_dir.join(DEFAULT_ACTIVATE),
            startup_log: base_dir.join(DEFAULT_STARTUP_LOG),
            components: procs::default_specs(&log_dir),
            log_dir,
            credentials: CredentialVars::default(),
        }
    }

    /// Load settings for `base_dir`
    ///
    /// An explicit `config` path must exist, the default `signalrc.toml` is optional.
    pub fn load(base_dir: &Path, config: Option<&Path>) -> Result<Self, Error> {
        let (path, required) = match config {
            Some(path) => (base_dir.join(path), true),
            None => (base_dir.join(CONFIG_FILE), false),
        };

        let file = match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!("loading configuration from {}", path.display());
                ConfigFile::parse(&contents)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                debug!("no configuration at {}, using defaults", path.display());
                ConfigFile::default()
            }
            Err(e) => return Err(Error::at_path(path, e)),
        };

        Self::from_config(base_dir, file)
    }

    pub fn from_config(base_dir: &Path, file: ConfigFile) -> Result<Self, Error> {
        let resolve = |p: Option<PathBuf>, default: &str| -> PathBuf {
            base_dir.join(p.unwrap_or_else(|| PathBuf::from(default)))
        };

        let activate = resolve(file.activate, DEFAULT_ACTIVATE);
        let startup_log = resolve(file.startup_log, DEFAULT_STARTUP_LOG);
        let log_dir = resolve(file.log_dir, DEFAULT_LOG_DIR);

        let mut components = procs::default_specs(&log_dir);
        for (name, over) in file.components {
            let spec = components
                .iter_mut()
                .find(|s| s.name == name)
                .ok_or_else(|| Error::from(ErrorKind::UnknownComponent(name.clone())))?;

            apply_override(spec, over, &log_dir)?;
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            activate,
            startup_log,
            log_dir,
            components,
            credentials: file.credentials,
        })
    }

    /// Hand the backup credentials to the maintenance component
    ///
    /// Missing credentials are not fatal, the maintenance monitor then starts without them.
    /// Returns whether credentials were attached.
    pub fn attach_credentials<F>(&mut self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = self.credentials.clone();
        let credentials =
            match Credentials::from_lookup(&vars.email_var, &vars.password_var, lookup) {
                Some(credentials) => credentials,
                None => {
                    warn!(
                        "{} and {} not set, the maintenance monitor starts without backup credentials",
                        vars.email_var, vars.password_var
                    );
                    return false;
                }
            };

        match self.maintenance_mut() {
            Some(spec) => {
                Maintenance::attach_credentials(spec, &credentials);
                true
            }
            None => false,
        }
    }

    /// The launch spec of the maintenance component
    pub fn maintenance_mut(&mut self) -> Option<&mut LaunchSpec> {
        self.components
            .iter_mut()
            .find(|s| s.name == Maintenance::NAME)
    }
}

fn apply_override(
    spec: &mut LaunchSpec,
    over: ComponentOverride,
    log_dir: &Path,
) -> Result<(), Error> {
    if let Some(program) = over.program {
        spec.program = program;
    }
    if let Some(args) = over.args {
        spec.args = args;
    }
    if let Some(log_file) = over.log_file {
        spec.log_file = log_dir.join(log_file);
    }
    if let Some(secs) = over.settle_secs {
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("{}: settle_secs must be a non-negative number", spec.name).into());
        }
        spec.settle = Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::from(format!("{}: settle_secs {}: {}", spec.name, secs, e)))?;
    }

    Ok(())
}

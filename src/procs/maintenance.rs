// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fmt;
use std::time::Duration;

use crate::procs::{Component, LaunchSpec};

/// Backups and system monitoring
///
/// Rules:
///   - launched last, nothing waits on it
///   - backup credentials are handed over in the environment, never as arguments
#[derive(Debug)]
pub struct Maintenance;

impl Component for Maintenance {
    const NAME: &'static str = "maintenance";
    const LABEL: &'static str = "System-Monitor";
    const SCRIPT: &'static str = "run_maintenance.py";
    const SETTLE: Duration = Duration::from_secs(0);
}

impl Maintenance {
    /// Variable the maintenance program reads the backup account email from
    pub const EMAIL_VAR: &'static str = "PCLOUD_EMAIL";
    /// Variable the maintenance program reads the backup account password from
    pub const PASSWORD_VAR: &'static str = "PCLOUD_PASSWORD";

    /// Forward the credentials to the maintenance child through its environment
    pub fn attach_credentials(spec: &mut LaunchSpec, credentials: &Credentials) {
        spec.env
            .retain(|(k, _)| k != Self::EMAIL_VAR && k != Self::PASSWORD_VAR);
        spec.env
            .push((Self::EMAIL_VAR.to_string(), credentials.email.clone()));
        spec.env
            .push((Self::PASSWORD_VAR.to_string(), credentials.password.clone()));
    }
}

/// Backup account for the maintenance program
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Look up both values by variable name, `None` if either is unset or empty
    pub fn from_lookup<F>(email_var: &str, password_var: &str, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(email_var).filter(|v| !v.is_empty())?;
        let password = lookup(password_var).filter(|v| !v.is_empty())?;

        Some(Self { email, password })
    }
}

// keep the password out of any diagnostics
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

// Copyright 2019 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

mod collector;
mod maintenance;
mod notifier;
mod signal;
mod technical;

pub use collector::Collector;
pub use maintenance::{Credentials, Maintenance};
pub use notifier::Notifier;
pub use signal::SignalGenerator;
pub use technical::TechnicalAnalyzer;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interpreter all runner scripts are started with, resolved on the activated `PATH`
pub const DEFAULT_PROGRAM: &str = "python";

/// Component names in launch order
pub const COMPONENT_NAMES: [&str; 5] = [
    Collector::NAME,
    TechnicalAnalyzer::NAME,
    SignalGenerator::NAME,
    Notifier::NAME,
    Maintenance::NAME,
];

/// A trait to define the defaults of one launched component
///
/// The launcher never looks inside a component, it only knows how to start it.
pub trait Component {
    /// Short name, used for configuration sections and the per-program log file
    const NAME: &'static str;
    /// Human readable name used in the startup log
    const LABEL: &'static str;
    /// Runner script handed to the interpreter
    const SCRIPT: &'static str;
    /// Time to wait after launching before the next component is started
    const SETTLE: Duration;

    fn log_file_name() -> String {
        format!("{}.log", Self::NAME)
    }

    fn spec(log_dir: &Path) -> LaunchSpec {
        LaunchSpec {
            name: Self::NAME.to_string(),
            label: Self::LABEL.to_string(),
            program: DEFAULT_PROGRAM.to_string(),
            args: vec![Self::SCRIPT.to_string()],
            log_file: log_dir.join(Self::log_file_name()),
            settle: Self::SETTLE,
            env: Vec::new(),
        }
    }
}

/// Everything needed to start one component
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchSpec {
    pub name: String,
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    /// stdout and stderr of the child, truncated on every launch
    pub log_file: PathBuf,
    pub settle: Duration,
    /// Extra variables for the child only, never placed on the command line
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// The command line as it would be typed, for diagnostics
    pub fn display_command(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// The five components in their fixed launch order
pub fn default_specs(log_dir: &Path) -> Vec<LaunchSpec> {
    vec![
        Collector::spec(log_dir),
        TechnicalAnalyzer::spec(log_dir),
        SignalGenerator::spec(log_dir),
        Notifier::spec(log_dir),
        Maintenance::spec(log_dir),
    ]
}

// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::warn;

use crate::Error;

/// Local time, second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a single startup log line
pub fn format_line(at: DateTime<Local>, message: &str) -> String {
    format!("{} - {}", at.format(TIMESTAMP_FORMAT), message)
}

/// Append-only startup log, every line is also echoed to stdout
///
/// Writing is best effort: a failed write is reported through tracing and the launcher carries on.
pub struct StartupLog {
    file: File,
    echo: bool,
}

impl StartupLog {
    /// Open (or create) the log for appending
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::at_path(path, e))?;

        Ok(Self { file, echo: true })
    }

    /// Disable the echo to stdout
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Timestamp `message`, append it and echo it, returns the line as written
    pub fn log(&mut self, message: &str) -> String {
        let line = format_line(Local::now(), message);

        if let Err(e) = writeln!(self.file, "{}", line).and_then(|_| self.file.flush()) {
            warn!("failed to write startup log: {}", e);
        }

        if self.echo {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            // a closed stdout must not stop the launch
            let _ = writeln!(out, "{}", line);
        }

        line
    }
}

// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("nix error: {0}")]
    NixError(#[from] nix::Error),
    #[error("invalid configuration: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("{path}: {source}")]
    PathError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown component: {0}")]
    UnknownComponent(String),
    #[error("an error occured: {0}")]
    ErrorMsg(String),
    #[error("an error occured: {0}")]
    ErrorStr(&'static str),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self(kind)
    }

    /// Attach the path an io operation was working on
    pub fn at_path(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::from_kind(ErrorKind::PathError {
            path: path.into(),
            source,
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

impl<E> From<E> for Error
where
    E: Into<ErrorKind>,
{
    fn from(err: E) -> Self {
        Self::from_kind(err.into())
    }
}

impl From<&'static str> for Error {
    fn from(err: &'static str) -> Self {
        Self::from_kind(ErrorKind::ErrorStr(err))
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::from_kind(ErrorKind::ErrorMsg(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_names_the_path() {
        let err = Error::at_path(
            "/nowhere/startup.log",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );

        let msg = err.to_string();
        assert!(msg.contains("/nowhere/startup.log"), "{}", msg);
        assert!(msg.contains("missing"), "{}", msg);
    }

    #[test]
    fn test_string_conversions() {
        let err = Error::from("static failure");
        assert!(matches!(err.kind(), ErrorKind::ErrorStr(_)));

        let err = Error::from(format!("owned {}", 1));
        assert_eq!(err.to_string(), "an error occured: owned 1");
    }
}

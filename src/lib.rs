// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Startup launcher for the trading signal system
//!
//! Activates the runtime environment, then starts the collector, technical analyzer, signal
//! generator, notifier and maintenance monitor one after the other as detached background
//! processes. Launches are fire-and-forget, the launcher never waits on a component.

pub mod config;
pub mod env;
mod error;
pub mod fork;
pub mod journal;
pub mod launcher;
pub mod procs;
pub mod status;

pub use error::{Error, ErrorKind};

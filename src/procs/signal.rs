// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::time::Duration;

use crate::procs::Component;

/// Turns analysis results into trading signals
#[derive(Debug)]
pub struct SignalGenerator;

impl Component for SignalGenerator {
    const NAME: &'static str = "signal";
    const LABEL: &'static str = "Signal Generator";
    const SCRIPT: &'static str = "run_signal_generator.py";
    const SETTLE: Duration = Duration::from_secs(3);
}

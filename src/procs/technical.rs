// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::time::Duration;

use crate::procs::Component;

/// Periodic technical analysis over the collected market data
#[derive(Debug)]
pub struct TechnicalAnalyzer;

impl Component for TechnicalAnalyzer {
    const NAME: &'static str = "technical";
    const LABEL: &'static str = "Technical Analyzer";
    const SCRIPT: &'static str = "run_technical_analysis.py";
    const SETTLE: Duration = Duration::from_secs(3);
}

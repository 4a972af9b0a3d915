// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::time::Duration;

use crate::procs::Component;

/// Market and news data collection
///
/// Started first, everything downstream reads what it writes, hence the longer settle time.
#[derive(Debug)]
pub struct Collector;

impl Component for Collector {
    const NAME: &'static str = "collector";
    const LABEL: &'static str = "Data Collector";
    const SCRIPT: &'static str = "run_collector.py";
    const SETTLE: Duration = Duration::from_secs(5);
}

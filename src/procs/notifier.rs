// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::time::Duration;

use crate::procs::Component;

/// Sends new signals and the daily summary out
#[derive(Debug)]
pub struct Notifier;

impl Component for Notifier {
    const NAME: &'static str = "notifier";
    const LABEL: &'static str = "Notifier";
    const SCRIPT: &'static str = "run_notifier.py";
    const SETTLE: Duration = Duration::from_secs(3);
}

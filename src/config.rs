/*
 *   Copyright (c) 2026 Helion Contributors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! C11 (ambient) — runtime configuration.
//!
//! Deliberately small: §1 excludes configuration file parsing from scope,
//! so this is just the handful of constants the main loop needs, with
//! defaults chosen to match §4.7's guidance.

use std::time::Duration;

/// Tunables for [`Scheduler`](crate::scheduler::Scheduler)'s main loop.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Consecutive main-loop iterations with no dispatched task before the
    /// busy-wait detector (§4.7 step 11) logs a warning and throttles.
    pub busy_wait_threshold: u32,
    /// How long to sleep once the busy-wait detector trips.
    pub busy_wait_backoff: Duration,
    /// Signals that trigger a shutdown broadcast when delivered (§5).
    pub shutdown_signals: &'static [std::os::raw::c_int],
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            // "N ≈ 16" per §4.7 step 11.
            busy_wait_threshold: 16,
            busy_wait_backoff: Duration::from_millis(1),
            shutdown_signals: &[signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM],
        }
    }
}

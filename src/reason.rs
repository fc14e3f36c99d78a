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

//! The bitmask that explains why a task became ready.
//!
//! A task's `reason` accumulates bits monotonically (see [`Reason`]); once
//! non-zero it is a candidate for promotion to a ready queue by the
//! readiness evaluator.

use bitflags::bitflags;

bitflags! {
    /// Bits explaining why a task was promoted to a ready queue.
    ///
    /// Set only by the readiness evaluator (never cleared), and observed by
    /// the task's callback via [`TaskContext::reason`](crate::context::TaskContext::reason).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Reason: u8 {
        /// The task's deadline has passed.
        const TIMEOUT      = 0b0000_0001;
        /// A wanted read FD became readable.
        const READ_READY    = 0b0000_0010;
        /// A wanted write FD became writable.
        const WRITE_READY   = 0b0000_0100;
        /// The task's prerequisite has completed.
        const PREREQ_DONE   = 0b0000_1000;
        /// Shutdown was requested; every pending task eventually sees this.
        const SHUTDOWN      = 0b0001_0000;
        /// Set only on the bootstrap task handed to [`register_continuation`](crate::scheduler::Scheduler::register_continuation).
        const STARTUP       = 0b0010_0000;
    }
}

impl Reason {
    /// A task with a non-zero reason is a candidate for the ready queue,
    /// subject to its prerequisite (if any) also being satisfied.
    #[must_use]
    pub fn is_pending_reason(self) -> bool { !self.is_empty() }
}

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

//! The context handed to a task's callback on dispatch (§6, Callback contract).

use crate::reason::Reason;
use crate::readiness_set::ReadinessSet;

/// What a callback sees when the dispatcher (C5) invokes it.
///
/// `read_ready`/`write_ready` are scoped to exactly what *this* task asked
/// for — the readiness evaluator replaces the task's wanted set with the
/// ready subset (§9, Open Questions) before dispatch, so a task that asked
/// for a whole [`ReadinessSet`] sees only the FDs that actually became
/// ready, never the full wanted set.
#[derive(Debug, Clone)]
pub struct TaskContext {
    reason: Reason,
    read_ready: ReadinessSet,
    write_ready: ReadinessSet,
}

impl TaskContext {
    pub(crate) fn new(reason: Reason, read_ready: ReadinessSet, write_ready: ReadinessSet) -> Self {
        Self { reason, read_ready, write_ready }
    }

    /// Why this task was promoted to a ready queue.
    #[must_use]
    pub fn reason(&self) -> Reason { self.reason }

    /// The subset of this task's wanted read FDs that are actually ready.
    /// Empty unless `reason()` contains [`Reason::READ_READY`].
    #[must_use]
    pub fn read_ready(&self) -> &ReadinessSet { &self.read_ready }

    /// The subset of this task's wanted write FDs that are actually ready.
    /// Empty unless `reason()` contains [`Reason::WRITE_READY`].
    #[must_use]
    pub fn write_ready(&self) -> &ReadinessSet { &self.write_ready }
}

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

//! C10 — Error taxonomy (§7).
//!
//! The scheduler never "returns an error" from its main loop; it either
//! completes cleanly (every pending store empty) or aborts. Per-registration
//! failures (bad argument, exhausted arena) are the only fallible public API
//! surface.

use std::io;
use thiserror::Error;

use crate::task::TaskId;

/// Errors a caller of the public API (§4.8) can observe.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `cancel(id)` named a task that isn't in any pending store — already
    /// dispatched, already cancelled, or never registered.
    #[error("no pending task with id {0:?}")]
    UnknownTask(TaskId),

    /// A registration call would need a new task identifier but the
    /// identifier space (or the backing arena) is exhausted.
    #[error("cannot allocate a new task record")]
    Exhausted,

    /// `current_reason()` was called outside of a running callback — no
    /// task is presently being dispatched for it to report on.
    #[error("no task is currently running")]
    NotRunning,
}

/// Fatal, unrecoverable failure of the blocking wait primitive (§7, "OS
/// wait failure"). The main loop aborts after producing this diagnostic;
/// it is never returned to a caller, only ever passed to `panic!`/logged.
#[derive(Debug, Error, miette::Diagnostic)]
#[error("scheduler main loop aborted: OS readiness wait failed")]
#[diagnostic(help("{fd_dump}"))]
pub struct FatalWaitError {
    #[source]
    pub source: io::Error,
    /// A human-readable dump of the FDs registered with the poller at the
    /// moment of failure, included as a diagnostic aid (§7).
    pub fd_dump: String,
}

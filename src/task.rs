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

//! C2 — Task Record: the immutable-after-registration descriptor of one
//! pending unit of work (§3).

use std::os::unix::io::RawFd;
use std::time::Instant;

use crate::context::TaskContext;
use crate::priority::Priority;
use crate::readiness_set::ReadinessSet;
use crate::reason::Reason;
use crate::scheduler::Scheduler;

/// Monotonically increasing task identifier, unique within a scheduler's
/// lifetime. `TaskId(0)` is reserved to mean "no task" (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// The reserved "no task" sentinel.
    pub const NONE: TaskId = TaskId(0);

    /// Whether this is the `NONE` sentinel.
    #[must_use]
    pub fn is_none(self) -> bool { self == Self::NONE }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A task's deadline: either an absolute instant or "never".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    At(Instant),
    Never,
}

impl Deadline {
    /// Whether this deadline has passed as of `now`.
    #[must_use]
    pub fn has_expired(self, now: Instant) -> bool {
        matches!(self, Deadline::At(at) if at <= now)
    }

    /// Ordering key used by the timeout list; `Never` sorts after every
    /// concrete deadline so it never reaches the head of that list.
    pub(crate) fn sort_key(self) -> Option<Instant> {
        match self {
            Deadline::At(at) => Some(at),
            Deadline::Never => None,
        }
    }
}

/// What FDs a task wants to watch, in either direction.
///
/// Carries both the fast-path single-FD form used by
/// `register_when_fd_ready` and the general form used by
/// `register_when_any_of`; the readiness evaluator treats both uniformly
/// by materializing a [`ReadinessSet`] view (see [`FdWant::as_set`]).
#[derive(Debug, Clone, Default)]
pub enum FdWant {
    #[default]
    None,
    Single(RawFd),
    Set(ReadinessSet),
}

impl FdWant {
    /// Whether this wants no FDs at all.
    #[must_use]
    pub fn is_none(&self) -> bool { matches!(self, FdWant::None) }

    /// A `ReadinessSet` view of whatever this wants, for aggregation into
    /// the main loop's wait vector (§4.7 step 2).
    #[must_use]
    pub fn as_set(&self) -> ReadinessSet {
        match self {
            FdWant::None => ReadinessSet::new(),
            FdWant::Single(fd) => ReadinessSet::from_iter([*fd]),
            FdWant::Set(set) => set.clone(),
        }
    }

    /// Whether `ready` overlaps what this wants (§4.4 step 2/3).
    #[must_use]
    pub fn overlaps(&self, ready: &ReadinessSet) -> bool {
        match self {
            FdWant::None => false,
            FdWant::Single(fd) => ready.is_set(*fd),
            FdWant::Set(set) => set.overlaps(ready),
        }
    }
}

/// The unit of work the callback performs, plus its context.
///
/// Boxed as `FnOnce` because a task record is destroyed immediately after
/// its single invocation (§3, Lifecycle) — there is no continuation to
/// call twice. A task that wants to run again must re-register from
/// within its own callback, producing a distinct [`TaskId`].
pub type Callback = Box<dyn FnOnce(&mut Scheduler, &TaskContext) + 'static>;

/// Optional registration-time diagnostics, gated behind the `profiling`
/// feature (§3, "optional profiling").
#[derive(Debug, Clone, Default)]
pub struct Profiling {
    pub enqueued_at: Option<Instant>,
    #[cfg(feature = "profiling")]
    pub backtrace: Option<std::sync::Arc<backtrace::Backtrace>>,
}

/// One pending (or ready, or running) unit of work.
///
/// All fields except `reason` are fixed at registration (§3). `reason` is
/// the only field the readiness evaluator mutates, and it only ever grows
/// (bits are OR'd in, never cleared) — becoming ready is a one-way
/// transition.
pub struct Task {
    pub id: TaskId,
    pub callback: Callback,
    pub priority: Priority,
    pub deadline: Deadline,
    pub wanted_read: FdWant,
    pub wanted_write: FdWant,
    /// Identifier of a task that must complete before this one runs;
    /// `TaskId::NONE` if there is no prerequisite.
    pub prerequisite: TaskId,
    pub reason: Reason,
    pub profiling: Profiling,
}

impl Task {
    /// Whether this task depends on another task's completion.
    #[must_use]
    pub fn has_prerequisite(&self) -> bool { !self.prerequisite.is_none() }

    /// Whether this task wants to watch any FD, in either direction.
    #[must_use]
    pub fn wants_fds(&self) -> bool {
        !self.wanted_read.is_none() || !self.wanted_write.is_none()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("deadline", &self.deadline)
            .field("prerequisite", &self.prerequisite)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

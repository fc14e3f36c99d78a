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

//! Task priority classes and the `KEEP` registration-time sentinel.

/// Priority class assigned to a task at registration.
///
/// Ready queues are indexed by this type (excluding [`Priority::Keep`],
/// which is normalized away before a task ever reaches a pending store —
/// see [`Priority::resolve`]). Ordering follows declaration order, so
/// `Priority::Urgent > Priority::Default` holds via `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Idle = 0,
    Background = 1,
    Default = 2,
    High = 3,
    Urgent = 4,
    /// Assigned only by the shutdown broadcaster; never chosen by a caller
    /// that isn't the scheduler itself.
    Shutdown = 5,
    /// Registration-time shorthand for "inherit the currently running
    /// task's priority". Never stored on a task record; normalized to a
    /// concrete priority by [`Priority::resolve`] before the record is
    /// created.
    Keep,
}

/// Number of concrete (non-`Keep`) priority classes; the width of the
/// ready-queue array.
pub const PRIORITY_COUNT: usize = 6;

impl Priority {
    /// All concrete priorities, lowest first. Does not include [`Priority::Keep`].
    pub const ALL: [Priority; PRIORITY_COUNT] = [
        Priority::Idle,
        Priority::Background,
        Priority::Default,
        Priority::High,
        Priority::Urgent,
        Priority::Shutdown,
    ];

    /// Index into the ready-queue array for this priority.
    ///
    /// # Panics
    ///
    /// Panics if called on [`Priority::Keep`]; callers must resolve `Keep`
    /// via [`Priority::resolve`] before storing a task.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Priority::Keep => unreachable!("Priority::Keep must be resolved before storage"),
            other => other as usize,
        }
    }

    /// Normalizes [`Priority::Keep`] to `current`, the priority of the
    /// task presently running (or `Priority::Default` if no task is
    /// running, e.g. during initial bootstrap).
    #[must_use]
    pub fn resolve(self, current: Priority) -> Priority {
        match self {
            Priority::Keep => current,
            other => other,
        }
    }
}

impl Default for Priority {
    fn default() -> Self { Priority::Default }
}

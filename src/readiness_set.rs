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

//! C1 — Readiness Set: an OS-agnostic collection of file descriptors.
//!
//! [`ReadinessSet`] is the abstract contract §4.1 describes: zero/clear,
//! set-by-native-FD, test-by-native-FD, union-into, copy-from, and
//! overlap-test. The main loop (`Scheduler::run_once`) is the only piece
//! that knows how this maps onto an OS readiness mechanism (`mio::Poll`);
//! `ReadinessSet` itself never touches `mio`.

use std::collections::HashSet;
use std::os::unix::io::RawFd;

/// A semantic set of file descriptors.
///
/// Backed by a `HashSet<RawFd>` rather than a native `fd_set`/`pollfd`
/// array: the scheduler's wanted-FD sets are rebuilt from scratch every
/// iteration (§4.7 step 2), so a plain hash set is both simpler and fast
/// enough — there is no long-lived OS handle to keep in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessSet {
    fds: HashSet<RawFd>,
}

impl ReadinessSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Clears every FD from the set.
    pub fn clear(&mut self) { self.fds.clear(); }

    /// Adds `fd` to the set.
    pub fn set(&mut self, fd: RawFd) { self.fds.insert(fd); }

    /// Removes `fd` from the set, if present.
    pub fn unset(&mut self, fd: RawFd) { self.fds.remove(&fd); }

    /// Whether `fd` is a member of the set.
    #[must_use]
    pub fn is_set(&self, fd: RawFd) -> bool { self.fds.contains(&fd) }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.fds.is_empty() }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize { self.fds.len() }

    /// Unions `other`'s members into `self`.
    pub fn union_into(&mut self, other: &ReadinessSet) {
        self.fds.extend(other.fds.iter().copied());
    }

    /// Replaces `self`'s contents with `other`'s.
    pub fn copy_from(&mut self, other: &ReadinessSet) {
        self.fds.clear();
        self.fds.extend(other.fds.iter().copied());
    }

    /// Whether `self` and `other` share at least one member.
    #[must_use]
    pub fn overlaps(&self, other: &ReadinessSet) -> bool {
        if self.fds.len() <= other.fds.len() {
            self.fds.iter().any(|fd| other.fds.contains(fd))
        } else {
            other.fds.iter().any(|fd| self.fds.contains(fd))
        }
    }

    /// Returns the intersection of `self` and `other` as a new set. Used to
    /// compute the "ready subset" a task's wanted set is replaced with once
    /// promoted (§9, Open Questions: replacement, not intersection-in-place
    /// of the *stored* set — but the value handed to the callback is
    /// exactly this intersection).
    #[must_use]
    pub fn intersection(&self, other: &ReadinessSet) -> ReadinessSet {
        let (smaller, larger) = if self.fds.len() <= other.fds.len() {
            (&self.fds, &other.fds)
        } else {
            (&other.fds, &self.fds)
        };
        ReadinessSet {
            fds: smaller.iter().copied().filter(|fd| larger.contains(fd)).collect(),
        }
    }

    /// Iterates over the set's members.
    pub fn iter(&self) -> impl Iterator<Item = RawFd> + '_ { self.fds.iter().copied() }
}

impl FromIterator<RawFd> for ReadinessSet {
    fn from_iter<T: IntoIterator<Item = RawFd>>(iter: T) -> Self {
        ReadinessSet { fds: iter.into_iter().collect() }
    }
}

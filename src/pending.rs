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

//! C3 — Pending Stores: the timeout list, the general pending list, and the
//! priority-indexed ready queues (§4.3).
//!
//! A [`Task`] is owned by exactly one of these at any time (or, transiently,
//! by the dispatcher while it runs) — the three `Vec`s below hold the
//! tasks directly rather than indices into a shared arena, so Rust's move
//! semantics enforce the "present in exactly one store" invariant (§3) at
//! the type level instead of relying on bookkeeping.

use crate::priority::{Priority, PRIORITY_COUNT};
use crate::task::{Task, TaskId};
use std::collections::HashSet;
use std::time::Instant;

/// The three pending stores plus the ready queues (§2, C3 is defined to
/// include all three; the readiness evaluator's prerequisite search spans
/// all of them, see `PendingStores::contains`).
#[derive(Default)]
pub struct PendingStores {
    /// Deadline-ascending; ties break by insertion order (stable, since we
    /// only ever insert at or after the position of equal deadlines).
    timeout_list: Vec<Task>,
    /// Unordered; holds any task with an FD-wait or a prerequisite.
    pending_list: Vec<Task>,
    /// LIFO per priority; index via `Priority::index`.
    ready_queues: [Vec<Task>; PRIORITY_COUNT],
    /// Smallest task id known to still be pending (timeout list, general
    /// list, or a ready queue). Any id strictly below this has already been
    /// dispatched or cancelled — the readiness evaluator uses this to skip
    /// a full scan when checking a prerequisite (§4.4 step 4).
    lowest_pending: u64,
}

impl PendingStores {
    #[must_use]
    pub fn new() -> Self {
        Self { lowest_pending: u64::MAX, ..Default::default() }
    }

    /// Inserts `task` into the timeout list, deadline-ascending.
    ///
    /// Attempts the tail fast path first (§4.3): if the new deadline is not
    /// earlier than the current tail's, append directly. This exploits the
    /// common pattern of registering many tasks with similar deadlines in
    /// bursts. Otherwise walks from the head to find the insertion point.
    pub fn push_timeout(&mut self, task: Task) {
        self.note_inserted(task.id);
        let new_key = task.deadline.sort_key();
        match self.timeout_list.last() {
            Some(tail) if Self::key_le(tail.deadline.sort_key(), new_key) => {
                self.timeout_list.push(task);
            }
            None => self.timeout_list.push(task),
            Some(_) => {
                let pos = self
                    .timeout_list
                    .iter()
                    .position(|t| !Self::key_le(t.deadline.sort_key(), new_key))
                    .unwrap_or(self.timeout_list.len());
                self.timeout_list.insert(pos, task);
            }
        }
    }

    /// `a <= b` where `None` (the `Deadline::Never` key) sorts last.
    fn key_le(a: Option<Instant>, b: Option<Instant>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a <= b,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => true,
        }
    }

    /// Inserts `task` into the general pending list (§4.3: "unshift").
    pub fn push_pending(&mut self, task: Task) {
        self.note_inserted(task.id);
        self.pending_list.insert(0, task);
    }

    /// Pushes `task` onto the LIFO ready queue for its (already-resolved,
    /// non-`Keep`) priority.
    pub fn push_ready(&mut self, task: Task) {
        self.note_inserted(task.id);
        let idx = task.priority.index();
        self.ready_queues[idx].push(task);
    }

    fn note_inserted(&mut self, id: TaskId) {
        self.lowest_pending = self.lowest_pending.min(id.0);
    }

    /// Removes and returns the task with identifier `id` from whichever
    /// store holds it. `O(n)` worst case (§4.3).
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        if let Some(pos) = self.timeout_list.iter().position(|t| t.id == id) {
            let task = self.timeout_list.remove(pos);
            self.on_removed(id);
            return Some(task);
        }
        if let Some(pos) = self.pending_list.iter().position(|t| t.id == id) {
            let task = self.pending_list.remove(pos);
            self.on_removed(id);
            return Some(task);
        }
        for queue in &mut self.ready_queues {
            if let Some(pos) = queue.iter().position(|t| t.id == id) {
                let task = queue.remove(pos);
                self.on_removed(id);
                return Some(task);
            }
        }
        None
    }

    /// Recomputes `lowest_pending` when it might have become stale, i.e.
    /// when the id that was the cached minimum is removed.
    fn on_removed(&mut self, removed: TaskId) {
        if removed.0 != self.lowest_pending {
            return;
        }
        self.lowest_pending = self
            .timeout_list
            .iter()
            .chain(self.pending_list.iter())
            .chain(self.ready_queues.iter().flatten())
            .map(|t| t.id.0)
            .min()
            .unwrap_or(u64::MAX);
    }

    /// Whether `id` names a task still held by any of the three stores.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.timeout_list.iter().any(|t| t.id == id)
            || self.pending_list.iter().any(|t| t.id == id)
            || self.ready_queues.iter().any(|q| q.iter().any(|t| t.id == id))
    }

    /// Fast-path prerequisite check (§4.4 step 4): `id` is definitely
    /// complete if it is strictly below the lowest pending identifier.
    #[must_use]
    pub fn definitely_complete(&self, id: TaskId) -> bool {
        id.0 < self.lowest_pending
    }

    /// The timeout list's head deadline, if any.
    #[must_use]
    pub fn earliest_deadline(&self) -> Option<Instant> {
        self.timeout_list.first().and_then(|t| t.deadline.sort_key())
    }

    pub fn timeout_list(&self) -> &[Task] { &self.timeout_list }
    pub fn pending_list(&self) -> &[Task] { &self.pending_list }

    pub fn timeout_list_mut(&mut self) -> &mut Vec<Task> { &mut self.timeout_list }
    pub fn pending_list_mut(&mut self) -> &mut Vec<Task> { &mut self.pending_list }

    /// Highest priority with a non-empty ready queue, if any are non-empty.
    #[must_use]
    pub fn highest_ready_priority(&self) -> Option<Priority> {
        Priority::ALL.iter().rev().copied().find(|p| !self.ready_queues[p.index()].is_empty())
    }

    /// Pops the top (LIFO) task from the ready queue for `priority`.
    pub fn pop_ready(&mut self, priority: Priority) -> Option<Task> {
        let task = self.ready_queues[priority.index()].pop();
        if let Some(t) = &task {
            self.on_removed(t.id);
        }
        task
    }

    /// Number of ready tasks at `priority`.
    #[must_use]
    pub fn ready_count(&self, priority: Priority) -> usize { self.ready_queues[priority.index()].len() }

    /// Total number of ready tasks across every priority.
    #[must_use]
    pub fn ready_count_total(&self) -> usize { self.ready_queues.iter().map(Vec::len).sum() }

    /// Whether any ready queue has at least one task.
    #[must_use]
    pub fn has_ready(&self) -> bool { self.ready_queues.iter().any(|q| !q.is_empty()) }

    /// Whether every store (timeout, pending, ready) is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeout_list.is_empty()
            && self.pending_list.is_empty()
            && self.ready_queues.iter().all(Vec::is_empty)
    }

    /// Iterates mutably over every task in the timeout list and the general
    /// pending list (not the ready queues) — used by the readiness
    /// evaluator's promotion sweep (§4.4).
    pub fn iter_waiting_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.timeout_list.iter_mut().chain(self.pending_list.iter_mut())
    }

    /// Iterates mutably over every task in every store, including the
    /// ready queues — used by the shutdown broadcaster (§4.6), which marks
    /// `SHUTDOWN` everywhere but only *routes* a task to the shutdown queue
    /// at promotion time.
    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.timeout_list
            .iter_mut()
            .chain(self.pending_list.iter_mut())
            .chain(self.ready_queues.iter_mut().flatten())
    }

    /// Ids currently held in the ready queue for `priority`, for the
    /// readiness evaluator's prerequisite snapshot.
    pub(crate) fn ready_ids(&self, priority: Priority) -> impl Iterator<Item = u64> + '_ {
        self.ready_queues[priority.index()].iter().map(|t| t.id.0)
    }

    /// Raw value of the lowest-pending-identifier cache (§3, Invariants).
    pub(crate) fn lowest_pending_raw(&self) -> u64 { self.lowest_pending }

    /// Every task id currently held anywhere (timeout list, general
    /// pending list, or a ready queue), for prerequisite resolution (§4.4
    /// step 4). Cheap relative to the scheduler's expected task counts;
    /// recomputed whenever a fresh snapshot is needed rather than kept
    /// live, since it's only consulted once per main-loop iteration and
    /// once per evaluation pass.
    #[must_use]
    pub fn snapshot_present_ids(&self) -> HashSet<u64> {
        let mut present: HashSet<u64> =
            self.timeout_list.iter().map(|t| t.id.0).chain(self.pending_list.iter().map(|t| t.id.0)).collect();
        for p in Priority::ALL {
            present.extend(self.ready_ids(p));
        }
        present
    }

    /// Whether `prereq` is satisfied: no prerequisite, below the
    /// lowest-pending cache, or simply absent from `present` (§4.4 step 4).
    #[must_use]
    pub fn prerequisite_resolved(&self, prereq: TaskId, present: &HashSet<u64>) -> bool {
        if prereq.is_none() {
            return true;
        }
        prereq.0 < self.lowest_pending || !present.contains(&prereq.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Priority;
    use crate::reason::Reason;
    use crate::task::{Deadline, FdWant, Profiling};
    use std::time::{Duration, Instant};

    fn dummy_task(id: u64, deadline: Deadline) -> Task {
        Task {
            id: TaskId(id),
            callback: Box::new(|_, _| {}),
            priority: Priority::Default,
            deadline,
            wanted_read: FdWant::None,
            wanted_write: FdWant::None,
            prerequisite: TaskId::NONE,
            reason: Reason::empty(),
            profiling: Profiling::default(),
        }
    }

    #[test]
    fn timeout_list_stays_sorted_with_tail_append() {
        let base = Instant::now();
        let mut stores = PendingStores::new();
        stores.push_timeout(dummy_task(1, Deadline::At(base + Duration::from_millis(10))));
        stores.push_timeout(dummy_task(2, Deadline::At(base + Duration::from_millis(20))));
        stores.push_timeout(dummy_task(3, Deadline::At(base + Duration::from_millis(5))));
        let ids: Vec<_> = stores.timeout_list().iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn lowest_pending_cache_tracks_removals() {
        let mut stores = PendingStores::new();
        stores.push_pending(dummy_task(5, Deadline::Never));
        stores.push_pending(dummy_task(2, Deadline::Never));
        assert!(stores.definitely_complete(TaskId(1)));
        assert!(!stores.definitely_complete(TaskId(2)));
        stores.remove(TaskId(2));
        assert!(stores.definitely_complete(TaskId(2)));
        assert!(!stores.definitely_complete(TaskId(5)));
    }

    #[test]
    fn ready_queues_are_lifo_per_priority() {
        let mut stores = PendingStores::new();
        stores.push_ready(dummy_task(1, Deadline::Never));
        stores.push_ready(dummy_task(2, Deadline::Never));
        assert_eq!(stores.pop_ready(Priority::Default).unwrap().id.0, 2);
        assert_eq!(stores.pop_ready(Priority::Default).unwrap().id.0, 1);
    }
}

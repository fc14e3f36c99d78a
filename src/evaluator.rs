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

//! C4 — Readiness Evaluator (§4.4).
//!
//! Given the current time and the OS-reported read/write readiness sets,
//! walks the timeout list and the general pending list, accumulates
//! `reason` bits, and promotes any task whose reason is non-zero (and
//! whose prerequisite, if any, is satisfied) into the ready queue for its
//! priority — or the `SHUTDOWN` queue, if the `SHUTDOWN` bit is among the
//! bits that just got set.

use std::collections::HashSet;
use std::time::Instant;

use crate::pending::PendingStores;
use crate::priority::Priority;
use crate::readiness_set::ReadinessSet;
use crate::reason::Reason;
use crate::task::{FdWant, TaskId};

impl PendingStores {
    /// Runs one evaluation pass; returns the ids promoted to a ready queue,
    /// in promotion order (timeout list first, then the general pending
    /// list), for callers that want to trace/log what just happened.
    pub fn evaluate(
        &mut self,
        now: Instant,
        read_ready: &ReadinessSet,
        write_ready: &ReadinessSet,
    ) -> Vec<TaskId> {
        // Snapshot of every id present anywhere in a pending store *before*
        // this pass mutates anything, for the prerequisite slow path
        // (§4.4 step 4: "search the pending stores for P"). A prerequisite
        // absent from this snapshot has already been dispatched elsewhere.
        let present: HashSet<u64> = self.snapshot_present_ids();
        let lowest_pending = self.lowest_pending_raw();

        let mut to_promote = Vec::new();

        // Timeout list: sorted ascending, so short-circuit at the first
        // task whose deadline hasn't passed and whose reason is still zero
        // (§4.4, "Timeout list short-circuit").
        for task in self.timeout_list_mut().iter_mut() {
            let expired = task.deadline.has_expired(now);
            if expired {
                task.reason |= Reason::TIMEOUT;
            }
            if !expired && task.reason.is_empty() {
                break;
            }
            if !task.reason.is_empty() {
                // Timeout-list tasks never have a prerequisite (§4.3).
                to_promote.push(task.id);
            }
        }

        // General pending list: no ordering to exploit, scan in full.
        for task in self.pending_list_mut().iter_mut() {
            if task.deadline.has_expired(now) {
                task.reason |= Reason::TIMEOUT;
            }
            if task.wanted_read.overlaps(read_ready) {
                task.reason |= Reason::READ_READY;
                task.wanted_read = FdWant::Set(task.wanted_read.as_set().intersection(read_ready));
            }
            if task.wanted_write.overlaps(write_ready) {
                task.reason |= Reason::WRITE_READY;
                task.wanted_write = FdWant::Set(task.wanted_write.as_set().intersection(write_ready));
            }

            if task.reason.is_empty() {
                continue;
            }

            if !task.has_prerequisite() {
                to_promote.push(task.id);
                continue;
            }

            if task.prerequisite.0 < lowest_pending || !present.contains(&task.prerequisite.0) {
                task.reason |= Reason::PREREQ_DONE;
                to_promote.push(task.id);
            }
        }

        for id in &to_promote {
            if let Some(mut task) = self.remove(*id) {
                if task.reason.contains(Reason::SHUTDOWN) {
                    task.priority = Priority::Shutdown;
                }
                self.push_ready(task);
            }
        }

        to_promote
    }
}

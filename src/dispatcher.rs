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

//! C5 — Dispatcher (§4.5).
//!
//! Drains the ready queues highest-priority-first, invoking each task's
//! callback exactly once. A burst of same-or-higher-priority arrivals
//! during the round keeps the dispatcher draining instead of yielding back
//! to the main loop, so urgent work finishes before the next blocking wait
//! — while lower-priority continuations yield promptly so FD events stay
//! timely.

use crate::context::TaskContext;
use crate::pending::PendingStores;
use crate::priority::Priority;
use crate::scheduler::Scheduler;

/// Runs one dispatch round: pops and invokes ready tasks until the round's
/// continuation rule (§4.5) says to stop. Returns the number of callbacks
/// invoked.
///
/// # Panics
///
/// Does not itself panic; a panicking callback unwinds through this
/// function and is the caller's concern (matching §7: per-task failures
/// are the task's own business, not the scheduler's).
pub fn dispatch_round(scheduler: &mut Scheduler) -> usize {
    let Some(mut max_priority_seen) = scheduler.stores.highest_ready_priority() else {
        return 0;
    };
    let mut run_count = 0;

    loop {
        let Some(priority) = scheduler.stores.highest_ready_priority() else { break };
        let Some(task) = scheduler.stores.pop_ready(priority) else { break };

        max_priority_seen = max_priority_seen.max(priority);
        let previous_priority = scheduler.current_priority;
        let previous_reason = scheduler.current_reason;
        scheduler.current_priority = Some(priority);
        scheduler.current_reason = Some(task.reason);

        let ctx = TaskContext::new(task.reason, task.wanted_read.as_set(), task.wanted_write.as_set());
        tracing::trace!(task = %task.id, priority = ?priority, reason = ?task.reason, "dispatching task");
        (task.callback)(scheduler, &ctx);
        scheduler.tasks_run += 1;
        run_count += 1;

        scheduler.current_priority = previous_priority;
        scheduler.current_reason = previous_reason;

        if should_keep_draining(&scheduler.stores, max_priority_seen) {
            continue;
        }
        break;
    }

    run_count
}

/// §4.5's continuation rule: keep popping as long as either
/// (a) more ready tasks exist and nothing is pending to wait on anyway, or
/// (b) a newly-added task is ready at or above the priority ceiling
///     observed so far this round.
fn should_keep_draining(stores: &PendingStores, max_priority_seen: Priority) -> bool {
    if !stores.has_ready() {
        return false;
    }
    if stores.timeout_list().is_empty() && stores.pending_list().is_empty() {
        return true;
    }
    stores.highest_ready_priority().is_some_and(|p| p >= max_priority_seen)
}

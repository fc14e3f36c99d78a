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

//! Testable properties not already exercised end-to-end by `scenarios.rs`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use helion_scheduler::{Priority, Scheduler, SchedulerConfig};

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig::default()).expect("scheduler setup should not fail in tests")
}

/// Property 2 — monotonic identifiers.
#[test]
fn monotonic_identifiers() {
    let mut sched = scheduler();
    let mut last = None;
    for _ in 0..20 {
        let id = sched.register_now(Box::new(|_sched, _ctx| {})).unwrap();
        if let Some(prev) = last {
            assert!(id > prev, "identifiers must strictly increase");
        }
        last = Some(id);
    }
}

/// Property 3 — timeout ordering: earlier deadlines run first among
/// timeout-only tasks.
#[test]
fn timeout_ordering() {
    let mut sched = scheduler();
    let order = Arc::new(Mutex::new(Vec::new()));

    let order_a = order.clone();
    sched
        .register_after_delay(
            Duration::from_millis(5),
            Priority::Default,
            Box::new(move |_sched, _ctx| order_a.lock().unwrap().push('A')),
        )
        .unwrap();
    let order_b = order.clone();
    sched
        .register_after_delay(
            Duration::from_millis(40),
            Priority::Default,
            Box::new(move |_sched, _ctx| order_b.lock().unwrap().push('B')),
        )
        .unwrap();

    sched.run();

    assert_eq!(*order.lock().unwrap(), vec!['A', 'B']);
}

/// Property 5 — LIFO within a priority: the task registered second at the
/// same priority and delay runs first.
#[test]
fn lifo_within_priority() {
    let mut sched = scheduler();
    let order = Arc::new(Mutex::new(Vec::new()));

    sched
        .register_now(Box::new({
            let order = order.clone();
            move |sched, _ctx| {
                let order_a = order.clone();
                sched
                    .register_after_delay(
                        Duration::ZERO,
                        Priority::Default,
                        Box::new(move |_sched, _ctx| order_a.lock().unwrap().push('A')),
                    )
                    .unwrap();
                let order_b = order.clone();
                sched
                    .register_after_delay(
                        Duration::ZERO,
                        Priority::Default,
                        Box::new(move |_sched, _ctx| order_b.lock().unwrap().push('B')),
                    )
                    .unwrap();
            }
        }))
        .unwrap();

    sched.run();

    assert_eq!(*order.lock().unwrap(), vec!['B', 'A']);
}

/// Property 9 — idempotent readiness: once a task's reason bits are set,
/// further evaluation passes don't clear them, even across a shutdown that
/// arrives after a timeout already fired but before dispatch — exercised
/// here by requesting shutdown from inside the callback itself, after the
/// task's own TIMEOUT bit is already what triggered it.
#[test]
fn idempotent_reason_bits() {
    let mut sched = scheduler();
    let observed = Arc::new(Mutex::new(None));
    let observed_cb = observed.clone();

    sched
        .register_after_delay(
            Duration::from_millis(5),
            Priority::Default,
            Box::new(move |sched, ctx| {
                let reason_before = ctx.reason();
                sched.request_shutdown();
                *observed_cb.lock().unwrap() = Some(reason_before);
            }),
        )
        .unwrap();

    sched.run();

    let reason = observed.lock().unwrap().expect("callback should have run");
    assert!(reason.contains(helion_scheduler::Reason::TIMEOUT));
}

/// Property 10 — no spurious wakeups: a task with an unresolved
/// prerequisite never reaches a ready queue (and so never runs) while its
/// prerequisite is still pending.
#[test]
fn no_spurious_wakeup_on_unresolved_prerequisite() {
    let mut sched = scheduler();
    let b_ran_before_a_finished = Arc::new(Mutex::new(false));
    let a_finished = Arc::new(Mutex::new(false));

    let a_finished_for_a = a_finished.clone();
    let a_id = sched
        .register_after_delay(
            Duration::from_millis(30),
            Priority::Default,
            Box::new(move |_sched, _ctx| {
                *a_finished_for_a.lock().unwrap() = true;
            }),
        )
        .unwrap();

    let a_finished_for_b = a_finished.clone();
    let b_ran_before_cb = b_ran_before_a_finished.clone();
    sched
        .register_after(
            a_id,
            Box::new(move |_sched, _ctx| {
                if !*a_finished_for_b.lock().unwrap() {
                    *b_ran_before_cb.lock().unwrap() = true;
                }
            }),
        )
        .unwrap();

    sched.run();

    assert!(!*b_ran_before_a_finished.lock().unwrap(), "B ran while its prerequisite A was still pending");
}

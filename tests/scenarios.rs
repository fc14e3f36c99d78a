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

//! End-to-end scenarios S1–S8.

use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use helion_scheduler::{Direction, Priority, Reason, Scheduler, SchedulerConfig};

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig::default()).expect("scheduler setup should not fail in tests")
}

#[test]
fn s1_pure_delay() {
    let mut sched = scheduler();
    let started = Instant::now();
    let observed = Arc::new(Mutex::new(None));
    let observed_cb = observed.clone();

    sched
        .register_after_delay(
            Duration::from_millis(50),
            Priority::Default,
            Box::new(move |_sched, ctx| {
                *observed_cb.lock().unwrap() = Some(ctx.reason());
            }),
        )
        .unwrap();

    sched.run();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "fired too early: {elapsed:?}");
    let reason = observed.lock().unwrap().expect("callback should have run");
    assert!(reason.contains(Reason::TIMEOUT));
    assert_eq!(reason, Reason::TIMEOUT);
}

#[test]
fn s2_fd_read() {
    let mut sched = scheduler();
    let (mut writer, reader) = UnixStream::pair().unwrap();
    let fd = reader.as_raw_fd();
    let observed = Arc::new(Mutex::new(None));
    let observed_cb = observed.clone();

    sched
        .register_when_fd_ready(
            None,
            fd,
            Direction::Read,
            Priority::Default,
            Box::new(move |_sched, ctx| {
                *observed_cb.lock().unwrap() = Some(ctx.reason());
            }),
        )
        .unwrap();

    writer.write_all(b"x").unwrap();
    sched.run();

    let reason = observed.lock().unwrap().expect("callback should have run");
    assert!(reason.contains(Reason::READ_READY));
    assert!(!reason.contains(Reason::TIMEOUT));
    drop(reader);
}

#[test]
fn s3_prerequisite_chain() {
    let mut sched = scheduler();
    let a_has_returned = Arc::new(Mutex::new(false));
    let b_reason = Arc::new(Mutex::new(None));
    let b_saw_a_finished = Arc::new(Mutex::new(false));

    let a_has_returned_for_a = a_has_returned.clone();
    let a_id = sched
        .register_now(Box::new(move |_sched, _ctx| {
            *a_has_returned_for_a.lock().unwrap() = true;
        }))
        .unwrap();

    let a_has_returned_for_b = a_has_returned.clone();
    let b_reason_cb = b_reason.clone();
    let b_saw_a_finished_cb = b_saw_a_finished.clone();
    sched
        .register_after(
            a_id,
            Box::new(move |_sched, ctx| {
                *b_saw_a_finished_cb.lock().unwrap() = *a_has_returned_for_b.lock().unwrap();
                *b_reason_cb.lock().unwrap() = Some(ctx.reason());
            }),
        )
        .unwrap();

    sched.run();

    assert!(*b_saw_a_finished.lock().unwrap(), "B ran before A returned");
    let reason = b_reason.lock().unwrap().expect("B should have run");
    assert!(reason.contains(Reason::PREREQ_DONE));
}

#[test]
fn s4_priority_preemption() {
    let mut sched = scheduler();
    let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    // A "main" task registers five DEFAULT tasks and one URGENT task, all
    // at zero delay, in one batch — URGENT must still drain first once
    // they're all promoted, regardless of registration order.
    sched
        .register_now(Box::new({
            let order = order.clone();
            move |sched, _ctx| {
                for _ in 0..5 {
                    let order = order.clone();
                    sched
                        .register_after_delay(
                            Duration::ZERO,
                            Priority::Default,
                            Box::new(move |_sched, _ctx| order.lock().unwrap().push("default")),
                        )
                        .unwrap();
                }
                let order = order.clone();
                sched
                    .register_after_delay(
                        Duration::ZERO,
                        Priority::Urgent,
                        Box::new(move |_sched, _ctx| order.lock().unwrap().push("urgent")),
                    )
                    .unwrap();
            }
        }))
        .unwrap();

    sched.run();

    let order = order.lock().unwrap();
    assert_eq!(order.len(), 6);
    assert_eq!(order[0], "urgent", "urgent-priority task must dispatch before any default task");
}

#[test]
fn s5_shutdown_cascade() {
    let mut sched = scheduler();
    let reasons = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let reasons_cb = reasons.clone();
        sched
            .register_after_delay(
                Duration::from_secs(3600),
                Priority::Default,
                Box::new(move |_sched, ctx| {
                    reasons_cb.lock().unwrap().push(ctx.reason());
                }),
            )
            .unwrap();
    }

    sched.request_shutdown();
    sched.run_once();

    let reasons = reasons.lock().unwrap();
    assert_eq!(reasons.len(), 3);
    for reason in reasons.iter() {
        assert!(reason.contains(Reason::SHUTDOWN));
        assert!(!reason.contains(Reason::TIMEOUT));
    }
}

#[test]
fn s6_cancellation() {
    let mut sched = scheduler();
    let ran = Arc::new(Mutex::new(false));
    let ran_cb = ran.clone();

    let id = sched
        .register_after_delay(
            Duration::from_millis(10),
            Priority::Default,
            Box::new(move |_sched, _ctx| {
                *ran_cb.lock().unwrap() = true;
            }),
        )
        .unwrap();

    sched.cancel(id).unwrap();
    sched.run();

    assert!(!*ran.lock().unwrap());
}

#[test]
fn s7_write_readiness_fast_path() {
    let mut sched = scheduler();
    let (writer, _reader) = UnixStream::pair().unwrap();
    let fd = writer.as_raw_fd();
    let observed = Arc::new(Mutex::new(None));
    let observed_cb = observed.clone();

    sched
        .register_when_fd_ready(
            None,
            fd,
            Direction::Write,
            Priority::Default,
            Box::new(move |_sched, ctx| {
                *observed_cb.lock().unwrap() = Some((ctx.reason(), ctx.write_ready().is_set(fd)));
            }),
        )
        .unwrap();

    sched.run();

    let (reason, fd_was_set) = observed.lock().unwrap().expect("callback should have run");
    assert!(reason.contains(Reason::WRITE_READY));
    assert!(fd_was_set);
}

#[test]
fn s8_reregistration_from_callback() {
    let mut sched = scheduler();
    let ids = Arc::new(Mutex::new(Vec::new()));
    let ids_cb = ids.clone();
    let ids_cb2 = ids.clone();

    sched
        .register_now(Box::new(move |sched, _ctx| {
            ids_cb.lock().unwrap().push(0u64);
            let new_id = sched
                .register_now(Box::new(move |_sched, _ctx| {
                    ids_cb2.lock().unwrap().push(1u64);
                }))
                .unwrap();
            // The freshly minted id must be strictly greater than any id
            // handed out so far (property 2).
            assert!(new_id > helion_scheduler::TaskId::NONE);
        }))
        .unwrap();

    sched.run();

    assert_eq!(*ids.lock().unwrap(), vec![0, 1]);
}

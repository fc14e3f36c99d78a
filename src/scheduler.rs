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

// cspell:words EINTR

//! C7 — Main Loop, and C8 — Public API.
//!
//! [`Scheduler`] owns every pending store, the OS poller, and the
//! shutdown self-pipe, and drives the single blocking-wait-then-dispatch
//! cycle described in §4.7. There is exactly one of these per thread that
//! uses it; nothing here is `Sync`.

use std::io;
use std::time::{Duration, Instant};

use mio::{Events, Interest, Token};
use mio::unix::SourceFd;

use crate::config::SchedulerConfig;
use crate::dispatcher::dispatch_round;
use crate::error::{FatalWaitError, SchedulerError};
use crate::pending::PendingStores;
use crate::priority::Priority;
use crate::readiness_set::ReadinessSet;
use crate::reason::Reason;
use crate::shutdown::{broadcast_shutdown, ShutdownPipe};
use crate::task::{Callback, Deadline, FdWant, Profiling, Task, TaskId};

/// Token reserved for the shutdown self-pipe; every other registration
/// uses `Token(fd as usize)`, and no legitimate FD is negative, so this
/// sentinel can't collide with a real FD-derived token.
const SHUTDOWN_TOKEN: Token = Token(usize::MAX);

/// Direction a task wants to watch an FD in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// The scheduler itself: pending stores, OS poller, shutdown pipe, and the
/// bookkeeping the public API and dispatcher need.
pub struct Scheduler {
    pub(crate) stores: PendingStores,
    poll: mio::Poll,
    shutdown_pipe: ShutdownPipe,
    next_id: u64,
    pub(crate) current_priority: Option<Priority>,
    pub(crate) current_reason: Option<Reason>,
    pub(crate) tasks_run: u64,
    config: SchedulerConfig,
    stale_iterations: u32,
    shutdown_requested: bool,
}

impl Scheduler {
    /// Builds a new scheduler with the given configuration, arming the
    /// self-pipe for `config.shutdown_signals` (§5).
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the poller or the self-pipe can't be
    /// created — a one-time setup failure, not the main loop's fatal-abort
    /// path (§7 distinguishes the two).
    pub fn new(config: SchedulerConfig) -> io::Result<Self> {
        let poll = mio::Poll::new()?;
        let mut shutdown_pipe = ShutdownPipe::new(SHUTDOWN_TOKEN, config.shutdown_signals)?;
        shutdown_pipe.register(poll.registry())?;
        Ok(Self {
            stores: PendingStores::new(),
            poll,
            shutdown_pipe,
            next_id: 1,
            current_priority: None,
            current_reason: None,
            tasks_run: 0,
            config,
            stale_iterations: 0,
            shutdown_requested: false,
        })
    }

    fn allocate_id(&mut self) -> Result<TaskId, SchedulerError> {
        if self.next_id == u64::MAX {
            return Err(SchedulerError::Exhausted);
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn resolve_priority(&self, priority: Priority) -> Priority {
        priority.resolve(self.current_priority.unwrap_or(Priority::Default))
    }

    // ---------------------------------------------------------------
    // C8 — Public API (§4.8)
    // ---------------------------------------------------------------

    /// `register-after-delay`: push to the timeout list.
    pub fn register_after_delay(
        &mut self,
        delay: Duration,
        priority: Priority,
        callback: Callback,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.allocate_id()?;
        let priority = self.resolve_priority(priority);
        let task = Task {
            id,
            callback,
            priority,
            deadline: Deadline::At(Instant::now() + delay),
            wanted_read: FdWant::None,
            wanted_write: FdWant::None,
            prerequisite: TaskId::NONE,
            reason: Reason::empty(),
            profiling: self.capture_profiling(),
        };
        tracing::trace!(task = %id, ?delay, "register_after_delay");
        self.stores.push_timeout(task);
        Ok(id)
    }

    /// `register-when-fd-ready`: push to the general pending list using the
    /// fast, single-FD form.
    pub fn register_when_fd_ready(
        &mut self,
        delay: Option<Duration>,
        fd: std::os::unix::io::RawFd,
        direction: Direction,
        priority: Priority,
        callback: Callback,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.allocate_id()?;
        let priority = self.resolve_priority(priority);
        let deadline = delay.map_or(Deadline::Never, |d| Deadline::At(Instant::now() + d));
        let (wanted_read, wanted_write) = match direction {
            Direction::Read => (FdWant::Single(fd), FdWant::None),
            Direction::Write => (FdWant::None, FdWant::Single(fd)),
        };
        let task = Task {
            id,
            callback,
            priority,
            deadline,
            wanted_read,
            wanted_write,
            prerequisite: TaskId::NONE,
            reason: Reason::empty(),
            profiling: self.capture_profiling(),
        };
        tracing::trace!(task = %id, fd, ?direction, "register_when_fd_ready");
        self.stores.push_pending(task);
        Ok(id)
    }

    /// `register-when-any-of`: the full form, with an arbitrary FD set in
    /// either direction and an optional prerequisite.
    #[allow(clippy::too_many_arguments)]
    pub fn register_when_any_of(
        &mut self,
        delay: Option<Duration>,
        read_set: ReadinessSet,
        write_set: ReadinessSet,
        prerequisite: TaskId,
        priority: Priority,
        callback: Callback,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.allocate_id()?;
        let priority = self.resolve_priority(priority);
        let deadline = delay.map_or(Deadline::Never, |d| Deadline::At(Instant::now() + d));
        let task = Task {
            id,
            callback,
            priority,
            deadline,
            wanted_read: FdWant::Set(read_set),
            wanted_write: FdWant::Set(write_set),
            prerequisite,
            reason: Reason::empty(),
            profiling: self.capture_profiling(),
        };
        tracing::trace!(task = %id, prerequisite = %prerequisite, "register_when_any_of");
        self.stores.push_pending(task);
        Ok(id)
    }

    /// `register-after`: zero-delay, prerequisite-only registration.
    pub fn register_after(&mut self, prerequisite: TaskId, callback: Callback) -> Result<TaskId, SchedulerError> {
        self.register_when_any_of(
            Some(Duration::ZERO),
            ReadinessSet::new(),
            ReadinessSet::new(),
            prerequisite,
            Priority::Keep,
            callback,
        )
    }

    /// `register-now`: zero-delay, no prerequisite, no FD-wait.
    pub fn register_now(&mut self, callback: Callback) -> Result<TaskId, SchedulerError> {
        self.register_after_delay(Duration::ZERO, Priority::Keep, callback)
    }

    /// `register-continuation`: place directly on a ready queue with a
    /// caller-supplied initial reason. Used by the runner to bootstrap the
    /// very first task with `Reason::STARTUP`.
    pub fn register_continuation(
        &mut self,
        priority: Priority,
        initial_reason: Reason,
        callback: Callback,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.allocate_id()?;
        let priority = self.resolve_priority(priority);
        let task = Task {
            id,
            callback,
            priority,
            deadline: Deadline::Never,
            wanted_read: FdWant::None,
            wanted_write: FdWant::None,
            prerequisite: TaskId::NONE,
            reason: initial_reason,
            profiling: self.capture_profiling(),
        };
        tracing::trace!(task = %id, ?initial_reason, "register_continuation");
        self.stores.push_ready(task);
        Ok(id)
    }

    /// `cancel(id)`: removes `id` from whichever store holds it and
    /// returns its closure so the caller can drop (or otherwise dispose
    /// of) it explicitly. Undefined if `id` has already started running —
    /// by the time a callback is executing, its record no longer lives in
    /// any store the scheduler can search.
    pub fn cancel(&mut self, id: TaskId) -> Result<Callback, SchedulerError> {
        self.stores.remove(id).map(|t| t.callback).ok_or(SchedulerError::UnknownTask(id))
    }

    /// `current-reason()`: the reason bits of whichever task is presently
    /// being dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRunning`] if called outside a running
    /// callback — there's no "current" task to report on.
    pub fn current_reason(&self) -> Result<Reason, SchedulerError> {
        self.current_reason.ok_or(SchedulerError::NotRunning)
    }

    /// `load(priority)`: ready-count for one priority class.
    #[must_use]
    pub fn load(&self, priority: Priority) -> usize {
        self.stores.ready_count(self.resolve_priority(priority))
    }

    /// `load(COUNT)`: total ready-task count across every priority.
    #[must_use]
    pub fn load_total(&self) -> usize { self.stores.ready_count_total() }

    /// Requests shutdown from within the process (as opposed to via a
    /// signal). Broadcasts immediately; the usual evaluation pass promotes
    /// affected tasks on the next iteration (§4.6).
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
        broadcast_shutdown(&mut self.stores);
    }

    /// Total number of callbacks the dispatcher has invoked so far.
    #[must_use]
    pub fn tasks_run(&self) -> u64 { self.tasks_run }

    fn capture_profiling(&self) -> Profiling {
        #[cfg(feature = "profiling")]
        {
            Profiling {
                enqueued_at: Some(Instant::now()),
                backtrace: Some(std::sync::Arc::new(backtrace::Backtrace::new())),
            }
        }
        #[cfg(not(feature = "profiling"))]
        {
            Profiling { enqueued_at: None }
        }
    }

    // ---------------------------------------------------------------
    // C7 — Main Loop (§4.7)
    // ---------------------------------------------------------------

    /// Runs the main loop until every store is empty.
    ///
    /// # Panics
    ///
    /// Aborts (via `panic!`) on an unrecoverable OS wait failure (§7, "OS
    /// wait failure"); `EINTR`-equivalent interruptions are retried, not
    /// propagated.
    pub fn run(&mut self) {
        while !self.stores.is_empty() {
            self.run_once();
        }
    }

    /// Runs exactly one main-loop iteration (§4.7 steps 1–11). Exposed
    /// separately from [`Scheduler::run`] so tests can single-step.
    pub fn run_once(&mut self) {
        let (timeout, read_wanted, write_wanted) = self.build_wait_vector();

        let mut registered: Vec<std::os::unix::io::RawFd> = Vec::new();
        let mut merged = std::collections::HashMap::<std::os::unix::io::RawFd, Interest>::new();
        for fd in read_wanted.iter() {
            merged.entry(fd).and_modify(|i| *i = i.add(Interest::READABLE)).or_insert(Interest::READABLE);
        }
        for fd in write_wanted.iter() {
            merged.entry(fd).and_modify(|i| *i = i.add(Interest::WRITABLE)).or_insert(Interest::WRITABLE);
        }
        for (&fd, &interest) in &merged {
            if self
                .poll
                .registry()
                .register(&mut SourceFd(&fd), Token(fd as usize), interest)
                .is_ok()
            {
                registered.push(fd);
            }
        }

        let mut events = Events::with_capacity(64);
        let wait_result = self.poll.poll(&mut events, timeout);

        for fd in &registered {
            let _ = self.poll.registry().deregister(&mut SourceFd(fd));
        }

        match wait_result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return,
            Err(e) => {
                let fd_dump = format!("{} FDs registered at failure time: {:?}", registered.len(), registered);
                let report = FatalWaitError { source: e, fd_dump };
                panic!("{:?}", miette::Report::new(report));
            }
        }

        let mut read_ready = ReadinessSet::new();
        let mut write_ready = ReadinessSet::new();
        let mut shutdown_signaled = false;
        for event in &events {
            if event.token() == SHUTDOWN_TOKEN {
                shutdown_signaled = true;
                continue;
            }
            let fd = event.token().0 as std::os::unix::io::RawFd;
            if event.is_readable() {
                read_ready.set(fd);
            }
            if event.is_writable() {
                write_ready.set(fd);
            }
        }

        if shutdown_signaled {
            match self.shutdown_pipe.drain() {
                Ok(true) => {
                    self.shutdown_requested = true;
                    broadcast_shutdown(&mut self.stores);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "failed draining shutdown pipe"),
            }
        }

        let now = Instant::now();
        let promoted = self.stores.evaluate(now, &read_ready, &write_ready);
        if !promoted.is_empty() {
            tracing::trace!(count = promoted.len(), "promoted tasks to ready queues");
        }

        let ran = if self.stores.has_ready() { dispatch_round(self) } else { 0 };

        self.track_busy_wait(ran);
    }

    /// §4.7 steps 1–4: builds the timeout, the union of wanted read/write
    /// FDs, and forces a zero timeout if anything is already ready.
    fn build_wait_vector(&self) -> (Option<Duration>, ReadinessSet, ReadinessSet) {
        let mut read_wanted = ReadinessSet::new();
        let mut write_wanted = ReadinessSet::new();
        let now = Instant::now();

        let mut soonest = self.stores.earliest_deadline();

        let present = self.stores.snapshot_present_ids();
        for task in self.stores.pending_list() {
            if !self.stores.prerequisite_resolved(task.prerequisite, &present) {
                continue;
            }
            if let Deadline::At(at) = task.deadline {
                soonest = Some(soonest.map_or(at, |s| s.min(at)));
            }
            read_wanted.union_into(&task.wanted_read.as_set());
            write_wanted.union_into(&task.wanted_write.as_set());
        }

        let mut timeout = soonest.map(|at| at.saturating_duration_since(now));
        if self.stores.has_ready() || self.shutdown_requested {
            // A shutdown already broadcast may have OR'd SHUTDOWN into a
            // timeout-list task's reason without promoting it yet (§4.6);
            // force an immediate re-evaluation rather than waiting out its
            // original deadline.
            timeout = Some(Duration::ZERO);
        }

        (timeout, read_wanted, write_wanted)
    }

    /// §4.7 step 11: if `tasks_run` hasn't advanced for `busy_wait_threshold`
    /// consecutive iterations, log a warning and sleep briefly.
    fn track_busy_wait(&mut self, ran_this_iteration: usize) {
        if ran_this_iteration > 0 {
            self.stale_iterations = 0;
            return;
        }
        self.stale_iterations += 1;
        if self.stale_iterations >= self.config.busy_wait_threshold {
            tracing::warn!(
                iterations = self.stale_iterations,
                "main loop made no progress for too many iterations; throttling"
            );
            std::thread::sleep(self.config.busy_wait_backoff);
            self.stale_iterations = 0;
        }
    }
}

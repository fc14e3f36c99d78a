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

//! A single-threaded cooperative task scheduler.
//!
//! Every unit of work is a [`Task`](task::Task) registered against a
//! [`Scheduler`], which owns the one blocking wait (timers, FD readiness,
//! prerequisite chains, and shutdown all unified behind a single
//! `mio::Poll`) that every other subsystem built on top of this crate
//! shares. There is no thread pool and no work-stealing: a single call to
//! [`Scheduler::run`] drives everything to completion.
//!
//! ```no_run
//! use std::time::Duration;
//! use helion_scheduler::{Priority, Scheduler, SchedulerConfig};
//!
//! let mut scheduler = Scheduler::new(SchedulerConfig::default())?;
//! scheduler.register_after_delay(Duration::from_millis(10), Priority::Default, Box::new(|_sched, _ctx| {
//!     println!("ten milliseconds later");
//! }))?;
//! scheduler.run();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod context;
mod dispatcher;
mod error;
mod evaluator;
mod pending;
mod priority;
mod readiness_set;
mod reason;
mod scheduler;
mod shutdown;
mod task;

pub use config::SchedulerConfig;
pub use context::TaskContext;
pub use error::{FatalWaitError, SchedulerError};
pub use priority::Priority;
pub use readiness_set::ReadinessSet;
pub use reason::Reason;
pub use scheduler::{Direction, Scheduler};
pub use task::{Callback, Deadline, FdWant, Task, TaskId};

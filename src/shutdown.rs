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

//! C6 — Shutdown Broadcaster (§4.6) and the self-pipe that feeds it.
//!
//! A shutdown request — explicit API call or OS signal — ORs [`Reason::SHUTDOWN`]
//! into every task's `reason` across every pending store. Tasks are *not*
//! moved to the ready queues here; the next evaluation pass does that,
//! additively with whatever other reason bits it discovers, preserving the
//! rule that promotion is decided in exactly one place (C4).
//!
//! The OS-signal path uses the textbook self-pipe idiom: `signal-hook`
//! installs an async-signal-safe handler that writes one byte per signal
//! to a pipe's write end; the main loop registers the read end with its
//! poller and treats it like any other wanted-read FD.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use mio::unix::pipe::{Receiver, Sender};
use mio::{Interest, Token};

use crate::pending::PendingStores;
use crate::reason::Reason;

/// The read end of the self-pipe, registered with the main loop's poller.
pub struct ShutdownPipe {
    receiver: Receiver,
    token: Token,
}

impl ShutdownPipe {
    /// Creates a fresh self-pipe and arms `signal-hook` to write to its
    /// write end whenever any of `signals` is delivered.
    ///
    /// # Errors
    ///
    /// Propagates any `io::Error` from creating the pipe or registering the
    /// signal handlers (§7, treated as a registration-time setup failure,
    /// not a main-loop fatal abort).
    pub fn new(token: Token, signals: &[std::os::raw::c_int]) -> io::Result<Self> {
        // `mio::unix::pipe::new` returns both ends already set non-blocking.
        let (sender, receiver) = mio::unix::pipe::new()?;
        for &signal in signals {
            // `pipe::register` is the safe wrapper: it only ever performs an
            // async-signal-safe `write(2)` of a single byte from the
            // handler, never allocating or locking.
            signal_hook::low_level::pipe::register(signal, sender.try_clone()?)?;
        }
        // Leak the sender deliberately: its only job is to be written to by
        // signal handlers for the lifetime of the process. `signal-hook`
        // keeps its own clone alive; we keep ours so the write end isn't
        // closed out from under a handler that fires during shutdown.
        std::mem::forget(sender);
        Ok(Self { receiver, token })
    }

    pub fn token(&self) -> Token { self.token }

    pub fn raw_fd(&self) -> RawFd { self.receiver.as_raw_fd() }

    /// Registers the read end with `registry` for read readiness.
    pub fn register(&mut self, registry: &mio::Registry) -> io::Result<()> {
        registry.register(&mut self.receiver, self.token, Interest::READABLE)
    }

    /// Drains every byte currently buffered in the pipe. Multiple signals
    /// delivered between two main-loop iterations coalesce into a single
    /// shutdown broadcast, which is correct: shutdown is a one-shot,
    /// monotonic transition (§4.6).
    ///
    /// Returns whether at least one byte was drained.
    pub fn drain(&mut self) -> io::Result<bool> {
        use std::io::Read;
        let mut buf = [0u8; 64];
        let mut drained_any = false;
        loop {
            match self.receiver.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => drained_any = true,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(drained_any)
    }
}

/// Broadcasts shutdown to every task in every pending store (§4.6).
///
/// Idempotent and cheap to call repeatedly: OR-ing `SHUTDOWN` into an
/// already-set reason is a no-op bit-for-bit, so a second shutdown request
/// (signal after API call, or vice versa) changes nothing.
pub fn broadcast_shutdown(stores: &mut PendingStores) {
    let mut count = 0;
    for task in stores.iter_all_mut() {
        if !task.reason.contains(Reason::SHUTDOWN) {
            count += 1;
        }
        task.reason |= Reason::SHUTDOWN;
    }
    tracing::debug!(newly_marked = count, "shutdown broadcast to every store");
}

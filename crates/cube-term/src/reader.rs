// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Single-byte stdin reads with a timeout.
//
// The picker is driven one keystroke at a time, so there is no background
// thread and no escape-sequence parser: each call waits up to the read
// timeout for one byte and returns. `poll()` provides the timeout even
// when stdin is not in raw mode, and lets us tell "no key yet" apart from
// "the terminal went away" (a readable fd whose read returns 0).
//
// Read errors are not surfaced. An interrupted or failed read is reported
// as `Idle` and the loop simply tries again on its next iteration.

#[cfg(unix)]
use std::io;
use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

/// The result of one attempt to read a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A byte arrived.
    Byte(u8),
    /// No byte within the timeout, or the read failed transiently.
    Idle,
    /// End of input: the terminal hung up or the source is exhausted.
    Closed,
}

/// Anything the event loop can pull keystrokes from.
pub trait ByteSource {
    /// Wait (bounded) for the next byte.
    fn next_byte(&mut self) -> ReadOutcome;
}

// ─── StdinBytes ──────────────────────────────────────────────────────────────

/// Reads stdin one byte at a time, waiting at most `timeout` per call.
pub struct StdinBytes {
    timeout: Duration,
}

impl StdinBytes {
    /// Create a reader with the given per-read timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[cfg(unix)]
    fn poll_timeout_ms(&self) -> i32 {
        i32::try_from(self.timeout.as_millis()).unwrap_or(i32::MAX)
    }
}

#[cfg(unix)]
impl ByteSource for StdinBytes {
    fn next_byte(&mut self) -> ReadOutcome {
        let fd = libc::STDIN_FILENO;

        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, self.poll_timeout_ms()) };

        if ready < 0 {
            trace!(error = %io::Error::last_os_error(), "stdin poll failed");
            return ReadOutcome::Idle;
        }
        if ready == 0 {
            return ReadOutcome::Idle;
        }
        if pfd.revents & libc::POLLIN == 0 {
            // POLLHUP / POLLERR / POLLNVAL without data: nothing more will come.
            return ReadOutcome::Closed;
        }

        let mut byte = 0u8;
        let n = unsafe { libc::read(fd, (&raw mut byte).cast(), 1) };
        match n {
            1 => ReadOutcome::Byte(byte),
            0 => ReadOutcome::Closed,
            _ => {
                trace!(error = %io::Error::last_os_error(), "stdin read failed");
                ReadOutcome::Idle
            }
        }
    }
}

/// Non-unix fallback: a blocking one-byte read with no timeout.
#[cfg(not(unix))]
impl ByteSource for StdinBytes {
    fn next_byte(&mut self) -> ReadOutcome {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match std::io::stdin().lock().read(&mut byte) {
            Ok(0) => ReadOutcome::Closed,
            Ok(_) => ReadOutcome::Byte(byte[0]),
            Err(e) => {
                trace!(error = %e, "stdin read failed");
                ReadOutcome::Idle
            }
        }
    }
}

// ─── Replay ──────────────────────────────────────────────────────────────────

/// Replays a fixed script of read outcomes, then reports [`ReadOutcome::Closed`].
///
/// Drives the event loop headlessly: scripted keystrokes, scripted timeouts.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    script: VecDeque<ReadOutcome>,
}

impl Replay {
    /// Replay the given outcomes in order.
    pub fn new(script: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Replay raw keystrokes with no idle reads in between.
    #[must_use]
    pub fn keys(keys: &[u8]) -> Self {
        Self::new(keys.iter().copied().map(ReadOutcome::Byte))
    }

    /// Outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ByteSource for Replay {
    fn next_byte(&mut self) -> ReadOutcome {
        self.script.pop_front().unwrap_or(ReadOutcome::Closed)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

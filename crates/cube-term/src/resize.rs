// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Resize notification: SIGWINCH turned into a redraw request.
//
// The signal handler does the one thing that is async-signal-safe: it
// stores `true` into an `AtomicBool`. It never renders. The event loop
// swaps the flag back to `false` at its next safe point (after each read,
// so at most one read timeout later) and redraws with the fresh size.
//
// Because rendering only ever happens on the loop's thread, two frames
// can never interleave on the terminal, and the color state is never
// touched from signal context.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Global flag set by the SIGWINCH handler.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
#[cfg(unix)]
fn install_sigwinch_handler() -> io::Result<()> {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        if libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() -> io::Result<()> {
    // No-op on non-unix platforms.
    Ok(())
}

// ─── ResizeSignal ────────────────────────────────────────────────────────────

/// A pending-redraw flag fed by terminal resize notifications.
///
/// [`ResizeSignal::sigwinch`] wires the flag to the real signal. Tests and
/// headless runs use [`ResizeSignal::from_flag`] with a flag of their own
/// and call [`notify`](Self::notify) by hand.
#[derive(Debug, Clone, Copy)]
pub struct ResizeSignal<'a> {
    flag: &'a AtomicBool,
}

impl ResizeSignal<'static> {
    /// Install the SIGWINCH handler and return the signal it feeds.
    ///
    /// Installing more than once is harmless; the handler is the same.
    ///
    /// # Errors
    ///
    /// Returns the OS error if `sigaction` fails.
    pub fn sigwinch() -> io::Result<Self> {
        install_sigwinch_handler()?;
        debug!("SIGWINCH handler installed");
        Ok(Self {
            flag: &SIGWINCH_RECEIVED,
        })
    }
}

impl<'a> ResizeSignal<'a> {
    /// Use an existing flag as the notification channel.
    #[must_use]
    pub const fn from_flag(flag: &'a AtomicBool) -> Self {
        Self { flag }
    }

    /// Mark a resize as pending.
    pub fn notify(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Consume a pending resize. Returns `true` at most once per burst of
    /// notifications.
    #[must_use]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::Relaxed)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flag_has_nothing_pending() {
        let flag = AtomicBool::new(false);
        let signal = ResizeSignal::from_flag(&flag);
        assert!(!signal.take());
    }

    #[test]
    fn notify_then_take_once() {
        let flag = AtomicBool::new(false);
        let signal = ResizeSignal::from_flag(&flag);
        signal.notify();
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn burst_of_notifications_coalesces() {
        let flag = AtomicBool::new(false);
        let signal = ResizeSignal::from_flag(&flag);
        signal.notify();
        signal.notify();
        signal.notify();
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn copies_share_the_flag() {
        let flag = AtomicBool::new(false);
        let a = ResizeSignal::from_flag(&flag);
        let b = a;
        a.notify();
        assert!(b.take());
    }

    #[cfg(unix)]
    #[test]
    fn sigwinch_handler_sets_global_flag() {
        let signal = ResizeSignal::sigwinch().unwrap();
        let _ = signal.take();
        unsafe {
            libc::raise(libc::SIGWINCH);
        }
        assert!(signal.take());
    }
}

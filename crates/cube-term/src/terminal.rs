// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, alternate screen, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control. Each unsafe block is
// minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios
// with a short read timeout (so the picker's loop wakes up even when no key
// is pressed), switches to the alternate screen, hides the cursor, and
// guarantees cleanup on drop, even if the picker panics mid-frame.
//
// The panic hook bypasses Rust's stdout lock entirely, writing a pre-built
// restore sequence directly to fd 1. A panic while a frame holds the lock
// would otherwise deadlock the hook. One raw write, termios restored, then
// the original panic handler prints its message to a working terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};
use std::time::Duration;

use tracing::debug;

use crate::ansi;
use crate::error::SessionError;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// The size reported when the terminal cannot be queried.
    pub const ZERO: Self = Self { cols: 0, rows: 0 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Fail with [`SessionError::NotATerminal`] unless stdin is a TTY.
///
/// [`Terminal::enter`] quietly skips raw mode without a TTY (so tests and
/// pipes keep working). Interactive front ends call this first to refuse
/// to run in that half-configured state.
///
/// # Errors
///
/// Returns [`SessionError::NotATerminal`] when stdin is not a terminal.
pub fn ensure_tty() -> Result<(), SessionError> {
    if is_tty() {
        Ok(())
    } else {
        Err(SessionError::NotATerminal)
    }
}

// ─── Read Policy ────────────────────────────────────────────────────────────

/// How `read()` on stdin behaves once raw mode is on (`VMIN` / `VTIME`).
///
/// The default, `VMIN = 0` and `VTIME = 1`, makes every read return after at
/// most a tenth of a second, with or without input. The loop stays
/// responsive to resize notifications without a reader thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    /// Minimum bytes before `read()` returns (`VMIN`).
    pub min_bytes: u8,
    /// Inter-byte timeout in tenths of a second (`VTIME`).
    pub timeout_tenths: u8,
}

impl ReadPolicy {
    /// The read timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(self) -> Duration {
        Duration::from_millis(self.timeout_tenths as u64 * 100)
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            min_bytes: 0,
            timeout_tenths: 1,
        }
    }
}

/// Transform a termios configuration into picker raw mode.
///
/// Turns off echo, canonical line buffering, extended input processing,
/// and signal keys; turns off break/CR-to-NL/parity/strip/flow-control
/// input handling and output post-processing; forces 8-bit characters;
/// and installs the read policy in `VMIN`/`VTIME`.
#[cfg(unix)]
pub fn apply_raw_mode(termios: &mut libc::termios, policy: ReadPolicy) {
    termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    termios.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    termios.c_oflag &= !libc::OPOST;
    termios.c_cflag |= libc::CS8;

    termios.c_cc[libc::VMIN] = policy.min_bytes;
    termios.c_cc[libc::VTIME] = policy.timeout_tenths;
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup (behind a [`Mutex`], not `static mut`)
/// lets the hook restore raw mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Complete terminal restore sequence for emergency use.
///
/// Reset SGR attributes (a panic can land between a slider cell and its
/// reset), show the cursor, exit the alternate screen. Alternate screen
/// exit is last so the restored shell content appears with no artifacts.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h\x1b[?1049l";

/// Panic hook guard. Ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal session handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch to picker mode (raw input,
/// alternate screen, hidden cursor). The terminal is restored by
/// [`leave`](Self::leave) or automatically when the handle is dropped.
///
/// # Example
///
/// ```no_run
/// use cube_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... read bytes, render frames ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), cube_term::SessionError>(())
/// ```
pub struct Terminal {
    /// Descriptor whose line discipline is switched (stdin).
    #[cfg(unix)]
    fd: libc::c_int,

    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// `VMIN`/`VTIME` applied on enter.
    policy: ReadPolicy,

    /// Whether we're in picker mode (raw + alt screen + hidden cursor).
    active: bool,
}

impl Terminal {
    /// Create a terminal handle with the default read policy.
    ///
    /// Does **not** touch the terminal; call [`enter`](Self::enter) for that.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ReadPolicy::default())
    }

    /// Create a terminal handle with a custom read policy.
    #[must_use]
    pub const fn with_policy(policy: ReadPolicy) -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDIN_FILENO,
            #[cfg(unix)]
            original_termios: None,
            policy,
            active: false,
        }
    }

    /// A handle driving the line discipline of `fd` instead of stdin.
    #[cfg(all(unix, test))]
    fn on_fd(fd: libc::c_int) -> Self {
        let mut term = Self::new();
        term.fd = fd;
        term
    }

    /// The read policy applied on [`enter`](Self::enter).
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Whether we're currently in picker mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter picker mode.
    ///
    /// Saves the current termios and applies raw mode (skipped when stdin
    /// is not a TTY), then switches to the alternate screen, hides the
    /// cursor and homes it.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GetAttr`] / [`SessionError::SetAttr`] if
    /// termios cannot be read or applied, [`SessionError::Io`] if the mode
    /// switch sequences cannot be written. On a write failure the original
    /// termios is already restored when this returns.
    pub fn enter(&mut self) -> Result<(), SessionError> {
        self.enter_with(&mut io::stdout().lock())
    }

    fn enter_with(&mut self, out: &mut impl Write) -> Result<(), SessionError> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        // From here on, leave undoes whatever raw mode setup did.
        self.active = true;

        if let Err(e) = write_enter_sequences(out) {
            let _ = self.leave_with(out);
            return Err(e.into());
        }

        debug!(policy = ?self.policy, "entered picker mode");
        Ok(())
    }

    /// Leave picker mode and restore the terminal.
    ///
    /// Exits the alternate screen, shows the cursor, and restores the
    /// original termios. Idempotent: calling `leave()` while inactive is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails. The
    /// termios restore is attempted even when the output fails, and the
    /// handle is inactive afterwards either way.
    pub fn leave(&mut self) -> Result<(), SessionError> {
        self.leave_with(&mut io::stdout().lock())
    }

    fn leave_with(&mut self, out: &mut impl Write) -> Result<(), SessionError> {
        if !self.active {
            return Ok(());
        }

        let written = write_leave_sequences(out);
        let restored = self.disable_raw_mode();
        self.active = false;

        restored?;
        written?;
        debug!("left picker mode");
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<(), SessionError> {
        if unsafe { libc::isatty(self.fd) } == 0 {
            return Ok(());
        }

        let fd = self.fd;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(SessionError::GetAttr(io::Error::last_os_error()));
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            apply_raw_mode(&mut termios, self.policy);

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(SessionError::SetAttr(io::Error::last_os_error()));
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<(), SessionError> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(self.fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(SessionError::SetAttr(io::Error::last_os_error()));
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Alternate screen, hidden cursor, cursor home.
fn write_enter_sequences(out: &mut impl Write) -> io::Result<()> {
    ansi::enter_alt_screen(out)?;
    ansi::cursor_hide(out)?;
    ansi::cursor_home(out)?;
    out.flush()
}

/// SGR reset, main screen, visible cursor.
fn write_leave_sequences(out: &mut impl Write) -> io::Result<()> {
    ansi::reset(out)?;
    ansi::exit_alt_screen(out)?;
    ansi::cursor_show(out)?;
    out.flush()
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Event loop: the heartbeat of the picker.
//
// One thread, one loop:
//
//   1. If the frame is dirty, query the terminal size, let the app paint a
//      complete frame into an `OutputBuffer`, and write it in one go.
//   2. Read one byte (bounded by the read timeout) and hand it to the app.
//   3. Consume a pending resize notification, if any.
//
// # Redraw policy
//
// Rendering is idempotent, so redrawing an unchanged frame is invisible.
// By default we only redraw when something changed: the first frame, a
// byte the app reports as state-changing, or a resize. Setting
// `LoopConfig::redraw_every_iteration` redraws after every read instead,
// including idle timeouts.
//
// # Resize
//
// The SIGWINCH handler only raises a flag (see `resize`). The loop checks
// it after every read, so the maximum latency from resize to redraw is one
// read timeout (100ms by default). Size is never cached: every frame asks
// the terminal again.

use std::io::{self, Write};

use tracing::{debug, trace, warn};

use crate::output::OutputBuffer;
use crate::reader::{ByteSource, ReadOutcome, StdinBytes};
use crate::resize::ResizeSignal;
use crate::terminal::{self, ReadPolicy, Size, Terminal};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing visible changed.
    Continue,
    /// State changed; paint a new frame.
    Redraw,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// Only [`paint`](App::paint) is required.
pub trait App {
    /// Handle one input byte.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_byte(&mut self, _byte: u8) -> Action {
        Action::Continue
    }

    /// Called when a resize notification is consumed, before the redraw.
    fn on_resize(&mut self, _size: Size) {}

    /// Paint a complete frame for the given terminal size.
    ///
    /// The buffer is empty on entry. Everything written here reaches the
    /// terminal in a single write.
    fn paint(&mut self, out: &mut OutputBuffer, size: Size);
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Configuration for the event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopConfig {
    /// Raw-mode read policy; its timeout also bounds resize latency.
    pub read_policy: ReadPolicy,

    /// Redraw after every read, even when nothing changed.
    pub redraw_every_iteration: bool,
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal session. Call [`run`](Self::run) to enter the loop;
/// it returns when the application signals [`Action::Quit`] or stdin
/// closes, with the terminal restored either way.
///
/// # Example
///
/// ```no_run
/// use cube_term::event_loop::{Action, App, EventLoop};
/// use cube_term::output::OutputBuffer;
/// use cube_term::terminal::Size;
///
/// struct Hello;
///
/// impl App for Hello {
///     fn on_byte(&mut self, byte: u8) -> Action {
///         if byte == b'q' { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint(&mut self, out: &mut OutputBuffer, size: Size) {
///         use std::io::Write;
///         let _ = write!(out, "\x1b[H{} x {}", size.cols, size.rows);
///     }
/// }
///
/// EventLoop::new().run(&mut Hello)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    config: LoopConfig,
}

impl EventLoop {
    /// Create a new event loop with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    /// Create a new event loop with custom configuration.
    #[must_use]
    pub const fn with_config(config: LoopConfig) -> Self {
        Self {
            terminal: Terminal::with_policy(config.read_policy),
            config,
        }
    }

    /// The loop configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> LoopConfig {
        self.config
    }

    /// Run the event loop until the application returns [`Action::Quit`].
    ///
    /// This method:
    /// 1. Enters picker mode (raw mode, alternate screen)
    /// 2. Installs the SIGWINCH handler
    /// 3. Drives the loop against stdin/stdout
    /// 4. Restores the terminal on exit (even on error)
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be entered or left, the
    /// resize handler cannot be installed, or a frame cannot be written.
    /// When the loop and the restore both fail, the loop's error wins and
    /// the restore failure is logged.
    pub fn run(&mut self, app: &mut impl App) -> Result<(), crate::SessionError> {
        self.terminal.enter()?;

        let result = ResizeSignal::sigwinch().and_then(|resize| {
            let mut input = StdinBytes::new(self.config.read_policy.timeout());
            let mut stdout = io::stdout();
            drive(
                app,
                &mut input,
                &mut stdout,
                resize,
                || terminal::get_size().unwrap_or(Size::ZERO),
                self.config,
            )
        });

        let left = self.terminal.leave();
        first_failure(result, left)
    }
}

/// The loop's error if it had one, otherwise the restore's.
fn first_failure(
    looped: io::Result<()>,
    left: Result<(), crate::SessionError>,
) -> Result<(), crate::SessionError> {
    match looped {
        Ok(()) => left,
        Err(e) => {
            if let Err(leave_err) = left {
                warn!(error = %leave_err, "terminal restore failed after loop error");
            }
            Err(e.into())
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

// ─── drive ───────────────────────────────────────────────────────────────────

/// The loop body, independent of the real terminal.
///
/// `query_size` is called before every frame. Returns when the app quits
/// or `input` reports [`ReadOutcome::Closed`].
///
/// # Errors
///
/// Returns an error if writing a frame to `sink` fails.
pub fn drive<A, S, W, Q>(
    app: &mut A,
    input: &mut S,
    sink: &mut W,
    resize: ResizeSignal<'_>,
    query_size: Q,
    config: LoopConfig,
) -> io::Result<()>
where
    A: App + ?Sized,
    S: ByteSource + ?Sized,
    W: Write + ?Sized,
    Q: Fn() -> Size,
{
    let mut frame = OutputBuffer::new();
    let mut dirty = true; // First frame always renders.

    loop {
        // ── Render if dirty ──────────────────────────────────
        if dirty || config.redraw_every_iteration {
            let size = query_size();
            frame.clear();
            app.paint(&mut frame, size);
            trace!(bytes = frame.len(), cols = size.cols, rows = size.rows, "frame");
            frame.flush_to(sink)?;
            dirty = false;
        }

        // ── Read one byte ────────────────────────────────────
        match input.next_byte() {
            ReadOutcome::Byte(byte) => match app.on_byte(byte) {
                Action::Quit => return Ok(()),
                Action::Redraw => dirty = true,
                Action::Continue => {}
            },
            ReadOutcome::Idle => {}
            ReadOutcome::Closed => {
                debug!("input closed, leaving event loop");
                return Ok(());
            }
        }

        // ── Check for terminal resize ────────────────────────
        if resize.take() {
            let size = query_size();
            debug!(cols = size.cols, rows = size.rows, "terminal resized");
            app.on_resize(size);
            dirty = true;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Replay;
    use std::cell::Cell;
    use std::sync::atomic::AtomicBool;

    /// Counts bytes and frames; paints the size it was given.
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
        frames: usize,
        resizes: Vec<Size>,
    }

    impl App for Recorder {
        fn on_byte(&mut self, byte: u8) -> Action {
            self.bytes.push(byte);
            match byte {
                b'q' => Action::Quit,
                b'x' => Action::Redraw,
                _ => Action::Continue,
            }
        }

        fn on_resize(&mut self, size: Size) {
            self.resizes.push(size);
        }

        fn paint(&mut self, out: &mut OutputBuffer, size: Size) {
            self.frames += 1;
            write!(out, "[{}x{}]", size.cols, size.rows).unwrap();
        }
    }

    fn fixed(cols: u16, rows: u16) -> impl Fn() -> Size {
        move || Size { cols, rows }
    }

    fn run_recorder(input: &mut Replay, config: LoopConfig) -> (Recorder, String) {
        let flag = AtomicBool::new(false);
        let mut app = Recorder::default();
        let mut sink = Vec::new();
        drive(
            &mut app,
            input,
            &mut sink,
            ResizeSignal::from_flag(&flag),
            fixed(80, 24),
            config,
        )
        .unwrap();
        (app, String::from_utf8(sink).unwrap())
    }

    // ── LoopConfig ──────────────────────────────────────────────

    #[test]
    fn default_config_redraws_on_change_only() {
        let config = LoopConfig::default();
        assert!(!config.redraw_every_iteration);
        assert_eq!(config.read_policy, ReadPolicy::default());
    }

    #[test]
    fn event_loop_keeps_config() {
        let config = LoopConfig {
            redraw_every_iteration: true,
            ..LoopConfig::default()
        };
        assert!(EventLoop::with_config(config).config().redraw_every_iteration);
    }

    // ── Action ──────────────────────────────────────────────────

    #[test]
    fn action_equality() {
        assert_eq!(Action::Continue, Action::Continue);
        assert_ne!(Action::Continue, Action::Redraw);
        assert_ne!(Action::Redraw, Action::Quit);
    }

    // ── drive ───────────────────────────────────────────────────

    #[test]
    fn first_frame_is_painted_before_input() {
        let (app, out) = run_recorder(&mut Replay::keys(b"q"), LoopConfig::default());
        assert_eq!(app.frames, 1);
        assert_eq!(out, "[80x24]");
    }

    #[test]
    fn quit_stops_reading() {
        let mut input = Replay::keys(b"aqzz");
        let (app, _) = run_recorder(&mut input, LoopConfig::default());
        assert_eq!(app.bytes, b"aq");
        assert_eq!(input.remaining(), 2);
    }

    #[test]
    fn only_redraw_actions_repaint() {
        let (app, _) = run_recorder(&mut Replay::keys(b"axaxq"), LoopConfig::default());
        assert_eq!(app.frames, 3); // initial + two `x`
    }

    #[test]
    fn idle_reads_do_not_repaint_by_default() {
        let mut input = Replay::new([ReadOutcome::Idle, ReadOutcome::Idle, ReadOutcome::Byte(b'q')]);
        let (app, _) = run_recorder(&mut input, LoopConfig::default());
        assert_eq!(app.frames, 1);
    }

    #[test]
    fn redraw_every_iteration_repaints_on_idle() {
        let mut input = Replay::new([ReadOutcome::Idle, ReadOutcome::Idle, ReadOutcome::Byte(b'q')]);
        let config = LoopConfig {
            redraw_every_iteration: true,
            ..LoopConfig::default()
        };
        let (app, _) = run_recorder(&mut input, config);
        assert_eq!(app.frames, 3);
    }

    #[test]
    fn closed_input_ends_loop() {
        let (app, _) = run_recorder(&mut Replay::keys(b"aa"), LoopConfig::default());
        assert_eq!(app.bytes, b"aa");
        assert_eq!(app.frames, 1);
    }

    #[test]
    fn pending_resize_repaints_with_fresh_size() {
        let flag = AtomicBool::new(false);
        let resize = ResizeSignal::from_flag(&flag);
        let size = Cell::new(Size { cols: 80, rows: 24 });

        // The byte source simulates a SIGWINCH arriving during the first read.
        struct ResizeDuringRead<'a> {
            resize: ResizeSignal<'a>,
            size: &'a Cell<Size>,
            inner: Replay,
        }
        impl ByteSource for ResizeDuringRead<'_> {
            fn next_byte(&mut self) -> ReadOutcome {
                if self.inner.remaining() == 2 {
                    self.size.set(Size { cols: 120, rows: 40 });
                    self.resize.notify();
                }
                self.inner.next_byte()
            }
        }

        let mut input = ResizeDuringRead {
            resize,
            size: &size,
            inner: Replay::new([ReadOutcome::Idle, ReadOutcome::Byte(b'q')]),
        };
        let mut app = Recorder::default();
        let mut sink = Vec::new();
        drive(
            &mut app,
            &mut input,
            &mut sink,
            resize,
            || size.get(),
            LoopConfig::default(),
        )
        .unwrap();

        assert_eq!(app.resizes, [Size { cols: 120, rows: 40 }]);
        assert_eq!(String::from_utf8(sink).unwrap(), "[80x24][120x40]");
        assert!(!resize.take(), "resize flag consumed");
    }

    #[test]
    fn write_failure_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let flag = AtomicBool::new(false);
        let err = drive(
            &mut Recorder::default(),
            &mut Replay::keys(b"q"),
            &mut Broken,
            ResizeSignal::from_flag(&flag),
            fixed(80, 24),
            LoopConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    // ── Exit errors ─────────────────────────────────────────────

    #[test]
    fn loop_error_wins_over_restore_error() {
        let looped = Err(io::Error::from(io::ErrorKind::BrokenPipe));
        let left = Err(crate::SessionError::SetAttr(io::Error::other("tcsetattr")));
        match first_failure(looped, left) {
            Err(crate::SessionError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected the loop's write error, got {other:?}"),
        }
    }

    #[test]
    fn restore_error_surfaces_after_clean_loop() {
        let left = Err(crate::SessionError::NotATerminal);
        assert!(matches!(
            first_failure(Ok(()), left),
            Err(crate::SessionError::NotATerminal)
        ));
        assert!(first_failure(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn frames_reach_unsized_sinks() {
        let flag = AtomicBool::new(false);
        let mut app = Recorder::default();
        let mut buf = Vec::new();
        let sink: &mut dyn Write = &mut buf;
        drive(
            &mut app,
            &mut Replay::keys(b"xq"),
            sink,
            ResizeSignal::from_flag(&flag),
            fixed(100, 30),
            LoopConfig::default(),
        )
        .unwrap();
        assert_eq!(buf, b"[100x30][100x30]");
    }

    // ── App trait defaults ─────────────────────────────────────

    struct MinimalApp;
    impl App for MinimalApp {
        fn paint(&mut self, _out: &mut OutputBuffer, _size: Size) {}
    }

    #[test]
    fn app_default_on_byte_continues() {
        assert_eq!(MinimalApp.on_byte(b'q'), Action::Continue);
    }

    #[test]
    fn app_default_on_resize_is_noop() {
        MinimalApp.on_resize(Size { cols: 100, rows: 50 });
    }
}

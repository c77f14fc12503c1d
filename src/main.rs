// SPDX-License-Identifier: MIT
//
// cubepick: pick a color from the 6×6×6 xterm palette cube.
//
// This is the main binary that wires the two crates together:
//
//   cube-term   → raw-mode session, resize signal, byte reader, event loop
//   cube-picker → color state, key bindings, geometry, frame rendering
//
// The Picker struct implements cube-term's App trait. Each keypress flows
// through:
//
//   stdin → on_byte → ColorState::interpret → Redraw?
//   paint → Geometry (fresh size) → render → one write to the terminal
//
// Keys: h/l adjust the selected channel, j/k change channel, r resets,
// q quits. The readout under the swatch is the escape to paste elsewhere.

use std::env;
use std::fs::OpenOptions;
use std::process;
use std::sync::{Mutex, OnceLock};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cube_picker::geometry::Geometry;
use cube_picker::keymap::StateChange;
use cube_picker::render::{escape_text, render};
use cube_picker::state::ColorState;

use cube_term::event_loop::{Action, App, EventLoop};
use cube_term::output::OutputBuffer;
use cube_term::terminal::{self, Size};

// ─── Picker ─────────────────────────────────────────────────────────────────

/// The running picker: its color state, nothing else.
#[derive(Debug, Default)]
struct Picker {
    state: ColorState,
}

impl Picker {
    fn new() -> Self {
        Self::default()
    }
}

impl App for Picker {
    fn on_byte(&mut self, byte: u8) -> Action {
        match self.state.interpret(byte) {
            StateChange::Exit => Action::Quit,
            StateChange::Updated => Action::Redraw,
            StateChange::Unchanged => Action::Continue,
        }
    }

    fn paint(&mut self, out: &mut OutputBuffer, size: Size) {
        if let Err(e) = render(out, &self.state, Geometry::from(size)) {
            warn!(error = %e, "frame render failed");
        }
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Log file location. The screen belongs to the picker, so logs never go
/// to stdout or stderr.
fn log_path() -> std::path::PathBuf {
    env::temp_dir().join("cubepick.log")
}

/// Install a file-backed subscriber when `RUST_LOG` is set.
fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return;
    };

    let _ = TRACING_INIT.get_or_init(|| {
        let Ok(file) = OpenOptions::new().create(true).append(true).open(log_path()) else {
            return;
        };
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run() -> anyhow::Result<()> {
    terminal::ensure_tty().context("cubepick needs an interactive terminal")?;

    let mut picker = Picker::new();
    EventLoop::new()
        .run(&mut picker)
        .context("terminal session failed")?;

    let index = picker.state.palette_index();
    info!(index, escape = %escape_text(index), "picker closed");
    Ok(())
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("cubepick: {e:#}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

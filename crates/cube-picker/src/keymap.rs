//! Key bindings: single bytes to state changes.
//!
//! | Key | Command      | Effect                                   |
//! |-----|--------------|------------------------------------------|
//! | `q` | `Quit`       | leave the picker                         |
//! | `r` | `Reset`      | all levels to 0, selection unchanged     |
//! | `j` | `SelectNext` | selection down, blue wraps to red        |
//! | `k` | `SelectPrev` | selection up, red wraps to blue          |
//! | `l` | `Increment`  | selected level + 1, clamped to 5         |
//! | `h` | `Decrement`  | selected level − 1, clamped to 0         |
//!
//! Every other byte is ignored. Input is read byte by byte in raw mode, so
//! arrow keys arrive as escape sequences whose bytes all land here and are
//! dropped individually.

use tracing::debug;

use crate::state::ColorState;

/// A picker command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Reset,
    SelectNext,
    SelectPrev,
    Increment,
    Decrement,
}

impl Command {
    /// The command bound to `byte`, if any.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'q' => Some(Self::Quit),
            b'r' => Some(Self::Reset),
            b'j' => Some(Self::SelectNext),
            b'k' => Some(Self::SelectPrev),
            b'l' => Some(Self::Increment),
            b'h' => Some(Self::Decrement),
            _ => None,
        }
    }
}

/// What a byte did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Unbound byte, or a step that hit a clamp boundary.
    Unchanged,
    /// Levels or selection changed; the screen is stale.
    Updated,
    /// The user asked to quit.
    Exit,
}

impl StateChange {
    const fn from_changed(changed: bool) -> Self {
        if changed { Self::Updated } else { Self::Unchanged }
    }
}

impl ColorState {
    /// Apply one command.
    pub fn apply(&mut self, command: Command) -> StateChange {
        let change = match command {
            Command::Quit => return StateChange::Exit,
            Command::Reset => StateChange::from_changed(self.reset()),
            Command::SelectNext => {
                self.select_next();
                StateChange::Updated
            }
            Command::SelectPrev => {
                self.select_prev();
                StateChange::Updated
            }
            Command::Increment => StateChange::from_changed(self.increment()),
            Command::Decrement => StateChange::from_changed(self.decrement()),
        };

        if change == StateChange::Updated {
            debug!(?command, rgb = ?self.rgb(), selected = %self.selected(), "state updated");
        }
        change
    }

    /// Interpret one input byte.
    pub fn interpret(&mut self, byte: u8) -> StateChange {
        Command::from_byte(byte).map_or(StateChange::Unchanged, |command| self.apply(command))
    }
}

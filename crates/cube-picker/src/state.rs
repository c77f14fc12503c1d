//! Color state: three cube levels and the channel being edited.
//!
//! Each channel holds a level in `0..=5`, one step along an axis of the
//! 6×6×6 palette cube. Exactly one channel is selected at a time; `h`/`l`
//! act on it and `j`/`k` move the selection (see [`crate::keymap`]).
//!
//! Levels can only change by a clamped step or a reset to zero, so the
//! state is always a valid cube coordinate.

use std::fmt;

use cube_term::color::{cube_index, CUBE_MAX_LEVEL};

/// Highest level a channel can hold.
pub const MAX_LEVEL: u8 = CUBE_MAX_LEVEL;

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One of the three color channels, in slider order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All channels, top slider first.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Position of the channel: 0 = red, 1 = green, 2 = blue.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    /// Channel at `index`, wrapping modulo 3.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 3]
    }

    /// The next channel down, wrapping blue → red.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The next channel up, wrapping red → blue.
    #[must_use]
    pub const fn prev(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => f.write_str("red"),
            Self::Green => f.write_str("green"),
            Self::Blue => f.write_str("blue"),
        }
    }
}

// ---------------------------------------------------------------------------
// ColorState
// ---------------------------------------------------------------------------

/// The picker's entire mutable state.
///
/// Starts at black `(0, 0, 0)` with red selected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColorState {
    levels: [u8; 3],
    selected: Channel,
}

impl ColorState {
    /// Black, red selected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            levels: [0; 3],
            selected: Channel::Red,
        }
    }

    /// A state with the given levels (clamped to [`MAX_LEVEL`]) and selection.
    #[must_use]
    pub const fn with_levels(r: u8, g: u8, b: u8, selected: Channel) -> Self {
        Self {
            levels: [clamp(r), clamp(g), clamp(b)],
            selected,
        }
    }

    /// Level of one channel.
    #[inline]
    #[must_use]
    pub const fn level(&self, channel: Channel) -> u8 {
        self.levels[channel.index()]
    }

    /// All three levels as `(r, g, b)`.
    #[inline]
    #[must_use]
    pub const fn rgb(&self) -> (u8, u8, u8) {
        (self.levels[0], self.levels[1], self.levels[2])
    }

    /// The channel `h`/`l` currently act on.
    #[inline]
    #[must_use]
    pub const fn selected(&self) -> Channel {
        self.selected
    }

    /// Palette index of the current color: `16 + 36r + 6g + b`.
    #[must_use]
    pub const fn palette_index(&self) -> u8 {
        cube_index(self.levels[0], self.levels[1], self.levels[2])
    }

    /// Raise the selected level by one. Returns `false` at [`MAX_LEVEL`].
    pub fn increment(&mut self) -> bool {
        let level = &mut self.levels[self.selected.index()];
        if *level >= MAX_LEVEL {
            return false;
        }
        *level += 1;
        true
    }

    /// Lower the selected level by one. Returns `false` at zero.
    pub fn decrement(&mut self) -> bool {
        let level = &mut self.levels[self.selected.index()];
        if *level == 0 {
            return false;
        }
        *level -= 1;
        true
    }

    /// Set every level to zero, keeping the selection. Returns `false` if
    /// the color was already black.
    pub fn reset(&mut self) -> bool {
        let changed = self.levels != [0; 3];
        self.levels = [0; 3];
        changed
    }

    /// Move the selection one channel down (cyclic).
    pub const fn select_next(&mut self) {
        self.selected = self.selected.next();
    }

    /// Move the selection one channel up (cyclic).
    pub const fn select_prev(&mut self) {
        self.selected = self.selected.prev();
    }
}

const fn clamp(level: u8) -> u8 {
    if level > MAX_LEVEL { MAX_LEVEL } else { level }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

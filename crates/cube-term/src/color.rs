// SPDX-License-Identifier: MIT
//
// Terminal colors.
//
// `CellColor` is the compact form that `ansi::bg` turns into escape
// sequences: 24-bit RGB for gradients, a 256-color palette index for
// anything that has to match what the user will paste elsewhere.
//
// The palette helpers cover the 6×6×6 cube (indices 16–231). Each axis
// has six steps, and the cube is laid out red-major:
//
//   index = 16 + 36·r + 6·g + b      (r, g, b ∈ 0..=5)

// ─── Cube constants ─────────────────────────────────────────────────────────

/// First palette index of the color cube.
pub const CUBE_BASE: u8 = 16;

/// Highest step along one cube axis.
pub const CUBE_MAX_LEVEL: u8 = 5;

// ─── CellColor ───────────────────────────────────────────────────────────────

/// Compact color for a single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// 24-bit `TrueColor` (the standard for modern terminals).
    Rgb(u8, u8, u8),

    /// ANSI 256-color palette index.
    Ansi256(u8),

    /// Terminal default color (inherits from terminal settings).
    #[default]
    Default,
}

/// Palette index of cube coordinates `(r, g, b)`, clamped per axis.
#[must_use]
pub const fn cube_index(r: u8, g: u8, b: u8) -> u8 {
    let r = clamp_level(r);
    let g = clamp_level(g);
    let b = clamp_level(b);
    CUBE_BASE + r * 36 + g * 6 + b
}

/// Linear 8-bit intensity for a cube level: 0, 51, 102, 153, 204, 255.
///
/// This is an even spread over `0..=255`, not the xterm palette's own
/// (0, 95, 135, …) ramp. Sliders use it for their gradient cells.
#[must_use]
pub const fn level_to_u8(level: u8) -> u8 {
    clamp_level(level) * 51
}

const fn clamp_level(level: u8) -> u8 {
    if level > CUBE_MAX_LEVEL {
        CUBE_MAX_LEVEL
    } else {
        level
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

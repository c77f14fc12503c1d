//! Terminal geometry: the clamped size a frame is laid out against.
//!
//! The event loop reads the size fresh for every frame and never caches
//! it. A failed query arrives here as `0 × 0`, which simply falls below the
//! minimum and renders the "too small" notice.

use cube_term::terminal::Size;

/// Narrowest terminal the picker lays out sliders for.
pub const MIN_COLS: u16 = 80;
/// Shortest terminal the picker lays out sliders for.
pub const MIN_ROWS: u16 = 15;

/// Columns beyond this are treated as a malformed size report.
pub const MAX_COLS: u16 = 500;
/// Rows beyond this are treated as a malformed size report.
pub const MAX_ROWS: u16 = 200;

/// Clamped terminal dimensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
}

impl Geometry {
    /// Clamp raw dimensions to `[0, MAX_COLS] × [0, MAX_ROWS]`.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: if cols > MAX_COLS { MAX_COLS } else { cols },
            rows: if rows > MAX_ROWS { MAX_ROWS } else { rows },
        }
    }

    /// Whether sliders and swatch fit: at least `MIN_COLS × MIN_ROWS`.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        self.cols >= MIN_COLS && self.rows >= MIN_ROWS
    }
}

impl From<Size> for Geometry {
    fn from(size: Size) -> Self {
        Self::new(size.cols, size.rows)
    }
}

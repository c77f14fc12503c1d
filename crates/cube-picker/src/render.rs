//! Renderer: one complete frame of escape sequences per call.
//!
//! Layout (1-based terminal coordinates, `mid = rows / 2`):
//!
//! ```text
//!  col cols/8                        col cols*3/4
//!  │                                 │
//!  │                                 ┌────────────────────┐  row mid-5
//!  ██████ red slider ██████          │                    │  row mid-4
//!  │                                 │  9 × 20 swatch     │
//!  ██████ green slider ████          │  (palette index)   │  row mid
//!  │                                 │                    │
//!  ██████ blue slider █████          └────────────────────┘  row mid+3
//!                                                            (blue: mid+4)
//!                                    escape: \e[38;5;Nm      row mid+5
//! ```
//!
//! Each slider is `cols / 2` cells of 24-bit background color. The slider's
//! own channel sweeps across the bar while the other two stay at their
//! current levels, so a bar shows exactly the colors its thumb can reach.
//! The thumb is a three-row marker centered on the bar, bright white
//! (SGR 107) on the selected slider and white (SGR 47) elsewhere.
//!
//! Rendering keeps no state between frames. Every frame starts by homing
//! the cursor and clearing the screen, so calling [`render`] twice with
//! the same inputs writes the same bytes twice.

use std::io::{self, Write};

use cube_term::ansi;
use cube_term::color::{level_to_u8, CellColor};
use unicode_width::UnicodeWidthStr;

use crate::geometry::Geometry;
use crate::state::{Channel, ColorState, MAX_LEVEL};

/// Swatch height in rows.
pub const SWATCH_ROWS: u16 = 9;
/// Swatch width in columns.
pub const SWATCH_COLS: u16 = 20;

/// Thumb background on the selected slider (bright white, SGR 107).
const THUMB_SELECTED: CellColor = CellColor::Ansi256(15);
/// Thumb background on the other sliders (white, SGR 47).
const THUMB_IDLE: CellColor = CellColor::Ansi256(7);

/// Write one frame for `state` laid out against `geometry`.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn render(out: &mut impl Write, state: &ColorState, geometry: Geometry) -> io::Result<()> {
    ansi::cursor_home(out)?;
    ansi::clear_below(out)?;

    if !geometry.is_usable() {
        too_small(out, geometry)?;
        return out.flush();
    }

    let mid = geometry.rows / 2;
    let left = geometry.cols / 8;
    let width = geometry.cols / 2;

    for (channel, row) in Channel::ALL.into_iter().zip([mid - 4, mid, mid + 4]) {
        move_to(out, row, left)?;
        draw_bar(out, state, channel, width)?;

        let thumb = left + u16::from(state.level(channel)) * (width - 1) / u16::from(MAX_LEVEL);
        move_to(out, row, thumb)?;
        draw_thumb(out, channel == state.selected())?;
    }

    let index = state.palette_index();
    let swatch_col = geometry.cols * 3 / 4;

    move_to(out, mid - 5, swatch_col)?;
    draw_swatch(out, index)?;

    move_to(out, mid + 5, swatch_col)?;
    write!(out, "escape: {}", escape_text(index))?;

    out.flush()
}

/// The foreground escape for a palette index, spelled out for copying:
/// `\e[38;5;{index}m` with a literal backslash-e.
#[must_use]
pub fn escape_text(index: u8) -> String {
    format!("\\e[38;5;{index}m")
}

/// The notice shown instead of the picker on small terminals.
#[must_use]
pub fn too_small_message(geometry: Geometry) -> String {
    format!("terminal too small: {} x {}", geometry.cols, geometry.rows)
}

// ─── Pieces ─────────────────────────────────────────────────────────────────

/// Centered "too small" notice. Coordinates that would fall off the top or
/// left edge are pinned to 1.
fn too_small(out: &mut impl Write, geometry: Geometry) -> io::Result<()> {
    let msg = too_small_message(geometry);
    let half = u16::try_from(msg.width() / 2).unwrap_or(u16::MAX);
    move_to(out, geometry.rows / 2, (geometry.cols / 2).saturating_sub(half))?;
    out.write_all(msg.as_bytes())
}

/// Gradient bar for `channel`, `width` cells starting at the cursor.
fn draw_bar(out: &mut impl Write, state: &ColorState, channel: Channel, width: u16) -> io::Result<()> {
    let (r, g, b) = state.rgb();
    let fixed = [level_to_u8(r), level_to_u8(g), level_to_u8(b)];

    for i in 0..width {
        let mut rgb = fixed;
        rgb[channel.index()] = sweep(i, width);
        ansi::bg(out, CellColor::Rgb(rgb[0], rgb[1], rgb[2]))?;
        out.write_all(b" ")?;
    }
    ansi::reset(out)
}

/// Channel intensity at cell `i` of a `width`-cell sweep: `i * 255 / width`.
fn sweep(i: u16, width: u16) -> u8 {
    let v = u32::from(i) * 255 / u32::from(width.max(1));
    u8::try_from(v).unwrap_or(u8::MAX)
}

/// Three-row thumb centered on the cursor's row.
fn draw_thumb(out: &mut impl Write, selected: bool) -> io::Result<()> {
    ansi::bg(out, if selected { THUMB_SELECTED } else { THUMB_IDLE })?;
    ansi::cursor_up(out, 1)?;
    out.write_all(b" ")?;
    for _ in 0..2 {
        ansi::cursor_down(out, 1)?;
        ansi::cursor_left(out, 1)?;
        out.write_all(b" ")?;
    }
    ansi::reset(out)
}

/// Solid swatch in palette color `index`, top-left at the cursor.
fn draw_swatch(out: &mut impl Write, index: u8) -> io::Result<()> {
    ansi::bg(out, CellColor::Ansi256(index))?;
    let row = [b' '; SWATCH_COLS as usize];
    for _ in 0..SWATCH_ROWS {
        out.write_all(&row)?;
        ansi::cursor_left(out, SWATCH_COLS)?;
        ansi::cursor_down(out, 1)?;
    }
    ansi::reset(out)
}

/// Move to a 1-based `(row, col)`, pinning zeros to 1.
fn move_to(out: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    ansi::cursor_to(out, col.saturating_sub(1), row.saturating_sub(1))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(state: &ColorState, geometry: Geometry) -> String {
        let mut out = Vec::new();
        render(&mut out, state, geometry).unwrap();
        String::from_utf8(out).unwrap()
    }

    // -- too small --------------------------------------------------------

    #[test]
    fn too_small_notice_exact_bytes() {
        let out = frame(&ColorState::new(), Geometry::new(40, 10));
        assert_eq!(out, "\x1b[H\x1b[J\x1b[5;7Hterminal too small: 40 x 10");
    }

    #[test]
    fn too_small_draws_nothing_else() {
        let out = frame(&ColorState::with_levels(5, 5, 5, Channel::Blue), Geometry::new(79, 50));
        assert!(!out.contains("\x1b[48;"));
        assert!(!out.contains("\x1b[47m"));
        assert!(!out.contains("\x1b[107m"));
        assert!(!out.contains("escape:"));
        assert!(out.ends_with("terminal too small: 79 x 50"));
    }

    #[test]
    fn too_small_uses_clamped_values() {
        let out = frame(&ColorState::new(), Geometry::from(cube_term::terminal::Size { cols: 70, rows: 900 }));
        assert!(out.contains("terminal too small: 70 x 200"));
    }

    #[test]
    fn zero_geometry_pins_notice_to_top_left() {
        let out = frame(&ColorState::new(), Geometry::from(cube_term::terminal::Size::ZERO));
        assert_eq!(out, "\x1b[H\x1b[J\x1b[1;1Hterminal too small: 0 x 0");
    }

    // -- full frame -------------------------------------------------------

    #[test]
    fn frame_starts_with_home_and_clear() {
        let out = frame(&ColorState::new(), Geometry::new(80, 24));
        assert!(out.starts_with("\x1b[H\x1b[J\x1b[8;10H"));
    }

    #[test]
    fn three_bars_of_half_width() {
        let out = frame(&ColorState::new(), Geometry::new(80, 24));
        assert_eq!(out.matches("\x1b[48;2;").count(), 3 * 40);
    }

    #[test]
    fn bars_sweep_their_own_channel() {
        let state = ColorState::with_levels(1, 2, 3, Channel::Red);
        let out = frame(&state, Geometry::new(80, 24));

        // Red bar: red sweeps, green/blue fixed at 102/153.
        assert!(out.contains("\x1b[8;10H\x1b[48;2;0;102;153m "));
        assert!(out.contains("\x1b[48;2;248;102;153m \x1b[0m"));
        // Green bar: green sweeps, red/blue fixed at 51/153.
        assert!(out.contains("\x1b[12;10H\x1b[48;2;51;0;153m "));
        // Blue bar: blue sweeps, red/green fixed at 51/102.
        assert!(out.contains("\x1b[16;10H\x1b[48;2;51;102;0m "));
    }

    #[test]
    fn thumbs_sit_at_their_levels() {
        let state = ColorState::with_levels(5, 0, 2, Channel::Green);
        let out = frame(&state, Geometry::new(80, 24));

        // width 40: offset = level * 39 / 5
        assert!(out.contains("\x1b[8;49H\x1b[47m\x1b[1A "));
        assert!(out.contains("\x1b[12;10H\x1b[107m\x1b[1A "));
        assert!(out.contains("\x1b[16;25H\x1b[47m\x1b[1A "));
    }

    #[test]
    fn thumb_is_three_rows_tall() {
        let out = frame(&ColorState::new(), Geometry::new(80, 24));
        assert!(out.contains("\x1b[107m\x1b[1A \x1b[1B\x1b[1D \x1b[1B\x1b[1D \x1b[0m"));
    }

    #[test]
    fn exactly_one_selected_thumb() {
        for channel in Channel::ALL {
            let out = frame(&ColorState::with_levels(0, 0, 0, channel), Geometry::new(100, 30));
            assert_eq!(out.matches("\x1b[107m").count(), 1);
            assert_eq!(out.matches("\x1b[47m").count(), 2);
        }
    }

    #[test]
    fn swatch_is_nine_by_twenty() {
        let out = frame(&ColorState::with_levels(5, 0, 0, Channel::Red), Geometry::new(80, 24));
        let row = format!("{}\x1b[20D\x1b[1B", " ".repeat(20));
        let expected = format!("\x1b[7;60H\x1b[48;5;196m{}\x1b[0m", row.repeat(9));
        assert!(out.contains(&expected));
    }

    #[test]
    fn readout_is_last_and_literal() {
        let out = frame(&ColorState::with_levels(5, 5, 5, Channel::Red), Geometry::new(80, 24));
        assert!(out.ends_with("\x1b[17;60Hescape: \\e[38;5;231m"));
    }

    #[test]
    fn readout_contains_palette_index() {
        for (state, index) in [
            (ColorState::with_levels(5, 0, 0, Channel::Red), "196"),
            (ColorState::new(), "16"),
            (ColorState::with_levels(5, 5, 5, Channel::Red), "231"),
        ] {
            let out = frame(&state, Geometry::new(120, 40));
            assert!(out.contains(&format!("escape: \\e[38;5;{index}m")));
        }
    }

    #[test]
    fn render_is_idempotent() {
        let geometries = [Geometry::new(80, 15), Geometry::new(203, 61), Geometry::new(30, 5)];
        for r in 0..=MAX_LEVEL {
            for g in 0..=MAX_LEVEL {
                for b in 0..=MAX_LEVEL {
                    for channel in Channel::ALL {
                        let state = ColorState::with_levels(r, g, b, channel);
                        for geometry in geometries {
                            assert_eq!(frame(&state, geometry), frame(&state, geometry));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn max_geometry_renders() {
        let out = frame(&ColorState::with_levels(5, 5, 5, Channel::Blue), Geometry::new(500, 200));
        assert_eq!(out.matches("\x1b[48;2;").count(), 3 * 250);
        assert!(out.ends_with("\x1b[105;375Hescape: \\e[38;5;231m"));
    }

    // -- helpers ----------------------------------------------------------

    #[test]
    fn sweep_spans_zero_to_just_under_full() {
        assert_eq!(sweep(0, 40), 0);
        assert_eq!(sweep(20, 40), 127);
        assert_eq!(sweep(39, 40), 248);
    }

    #[test]
    fn escape_text_is_literal() {
        assert_eq!(escape_text(196), r"\e[38;5;196m");
    }
}

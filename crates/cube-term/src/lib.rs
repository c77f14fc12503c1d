// SPDX-License-Identifier: MIT
//
// cube-term: terminal plumbing for cubepick.
//
// No TUI framework, just raw termios, hand-written escape sequences and a
// single-threaded loop. The picker redraws its whole screen on every frame,
// so there is no cell buffer and no diffing here. A frame is built in
// memory and written in one call.
//
//   terminal   → raw mode session guard, size query, panic-safe restore
//   resize     → SIGWINCH → pending-redraw flag
//   reader     → one byte per read, bounded by the read timeout
//   ansi       → escape sequence encoding
//   color      → cell colors and the 6×6×6 palette cube
//   output     → whole-frame output buffer
//   event_loop → read / interpret / redraw heartbeat

pub mod ansi;
pub mod color;
pub mod error;
pub mod event_loop;
pub mod output;
pub mod reader;
pub mod resize;
pub mod terminal;

pub use error::SessionError;

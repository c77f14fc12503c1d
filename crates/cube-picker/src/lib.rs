//! # cube-picker: picker core for cubepick
//!
//! Everything the picker knows, independent of how bytes reach the
//! terminal:
//!
//! - **[`state`]**: `ColorState`, three levels in `0..=5` plus the selected channel
//! - **[`keymap`]**: `q`/`r`/`j`/`k`/`l`/`h` → `StateChange`
//! - **[`geometry`]**: clamped terminal size and the minimum-size check
//! - **[`render`]**: the full escape-sequence frame for a state and geometry
//!
//! The terminal session, resize signal and event loop live in `cube-term`.

pub mod geometry;
pub mod keymap;
pub mod render;
pub mod state;

// SPDX-License-Identifier: MIT
//
// Terminal session errors.
//
// Raw mode is all-or-nothing: without it keystrokes echo, arrive a line at
// a time, and `h`/`j`/`k`/`l` never reach the picker. None of these are
// recoverable once the session has started.

use std::io;

/// Errors raised while entering or leaving the terminal session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("stdin is not a terminal")]
    NotATerminal,

    #[error("failed to read terminal attributes: {0}")]
    GetAttr(#[source] io::Error),

    #[error("failed to apply terminal attributes: {0}")]
    SetAttr(#[source] io::Error),

    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

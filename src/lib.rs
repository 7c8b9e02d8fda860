// SPDX-License-Identifier: MIT
//
// vtio — terminal control and input events over raw ANSI escape sequences.
//
// Two halves, tightly coupled:
//
// - An event parser that turns arbitrarily-chunked bytes from the
//   terminal into structured events (keys, mouse, paste, focus),
//   resolving the lone-ESC ambiguity with a timeout.
// - A buffered terminal handle that encodes control sequences, tracks
//   idempotent terminal modes (raw mode, alternate screen, mouse
//   capture, bracketed paste, focus events, cursor visibility), and
//   drives the parser from a blocking `read_event` loop.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for. Every escape code is earned.

pub mod ansi;
pub mod capabilities;
pub mod color;
pub mod input;
pub mod scope;
pub mod style;
pub mod terminal;
pub mod tty;

pub use ansi::{ClipboardTarget, MouseCapture};
pub use capabilities::{Capabilities, ColorLevel};
pub use color::{Color, NamedColor};
pub use input::{
    Event, EventParser, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseKind,
};
pub use scope::Scope;
pub use style::{Attr, Style};
pub use terminal::Terminal;
pub use tty::{InputSource, OutputSink, Size, TtyInput, TtyOutput};

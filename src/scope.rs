// SPDX-License-Identifier: MIT
//
// Scoped terminal modes with guaranteed restore.
//
// A `Scope` is a builder over `&Terminal`: each call enables a mode
// immediately and records its inverse. `run` executes the body and
// then — unconditionally — replays the inverses in reverse order and
// flushes, so the terminal leaves the block exactly as it entered it.
// A `Drop` impl replays the restores on panic as well.

use std::io;

use crate::ansi::MouseCapture;
use crate::terminal::Terminal;
use crate::tty::{InputSource, OutputSink};

/// Recorded inverse of one scoped enable.
enum Restore {
    Raw,
    AltScreen,
    Mouse,
    Paste,
    Focus,
    Cursor,
}

/// Scoped mode block; see [`Terminal::scoped`].
///
/// # Example
///
/// ```no_run
/// use vtio::Terminal;
///
/// let term = Terminal::stdio();
/// term.scoped()
///     .raw_mode()?
///     .alternate_screen()
///     .hidden_cursor()
///     .run(|t| {
///         t.move_to(0, 0).print("full-screen mode");
///         t.flush()
///     })?;
/// // Everything restored here, even if the body failed.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Scope<'a, I: InputSource, O: OutputSink> {
    term: &'a Terminal<I, O>,
    restore: Vec<Restore>,
    done: bool,
}

impl<'a, I: InputSource, O: OutputSink> Scope<'a, I, O> {
    pub(crate) fn new(term: &'a Terminal<I, O>) -> Self {
        Self {
            term,
            restore: Vec::new(),
            done: false,
        }
    }

    /// Enable raw mode for the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the device-mode switch fails.
    pub fn raw_mode(mut self) -> io::Result<Self> {
        self.term.enable_raw_mode()?;
        self.restore.push(Restore::Raw);
        Ok(self)
    }

    /// Enter the alternate screen for the scope.
    #[must_use]
    pub fn alternate_screen(mut self) -> Self {
        self.term.enter_alternate_screen();
        self.restore.push(Restore::AltScreen);
        self
    }

    /// Enable mouse capture for the scope.
    #[must_use]
    pub fn mouse_capture(mut self, mode: MouseCapture) -> Self {
        self.term.enable_mouse_capture(mode);
        self.restore.push(Restore::Mouse);
        self
    }

    /// Enable bracketed paste for the scope.
    #[must_use]
    pub fn bracketed_paste(mut self) -> Self {
        self.term.enable_bracketed_paste();
        self.restore.push(Restore::Paste);
        self
    }

    /// Enable focus events for the scope.
    #[must_use]
    pub fn focus_events(mut self) -> Self {
        self.term.enable_focus_events();
        self.restore.push(Restore::Focus);
        self
    }

    /// Hide the cursor for the scope.
    #[must_use]
    pub fn hidden_cursor(mut self) -> Self {
        self.term.hide_cursor();
        self.restore.push(Restore::Cursor);
        self
    }

    /// Run the body, then restore every entered mode in reverse order
    /// and flush — also when the body fails.
    ///
    /// # Errors
    ///
    /// The body's error propagates after restoration; a restore or
    /// flush error is reported only when the body succeeded.
    pub fn run<T>(mut self, body: impl FnOnce(&Terminal<I, O>) -> io::Result<T>) -> io::Result<T> {
        let result = body(self.term);
        let restored = self.finish();
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Replay recorded inverses in reverse order, then flush.
    fn finish(&mut self) -> io::Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;

        let mut result = Ok(());
        for restore in self.restore.iter().rev() {
            match restore {
                Restore::Raw => {
                    if let Err(e) = self.term.disable_raw_mode() {
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
                Restore::AltScreen => {
                    self.term.leave_alternate_screen();
                }
                Restore::Mouse => {
                    self.term.disable_mouse_capture();
                }
                Restore::Paste => {
                    self.term.disable_bracketed_paste();
                }
                Restore::Focus => {
                    self.term.disable_focus_events();
                }
                Restore::Cursor => {
                    self.term.show_cursor();
                }
            }
        }

        if let Err(e) = self.term.flush() {
            if result.is_ok() {
                result = Err(e);
            }
        }
        result
    }
}

impl<I: InputSource, O: OutputSink> Drop for Scope<'_, I, O> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

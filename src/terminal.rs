// SPDX-License-Identifier: MIT
//
// Buffered terminal handle with tracked mode state.
//
// Two pieces work together here:
//
//   OutputBuffer — accumulates encoded bytes in memory so that any
//   number of commands can be written to the device in a single
//   write() call. This keeps partial escape sequences from ever
//   hitting the wire and reduces syscall overhead.
//
//   ModeState — remembers which terminal modes are currently enabled
//   so every toggle is idempotent: asking for a mode the terminal is
//   already in writes nothing and changes nothing.
//
// One mutex guards the buffer and the mode state together, so a
// toggle's buffer append and state flip are atomic as a pair. The only
// blocking wait — readiness inside `read_event` — runs with no lock
// held; a reader parked on input never blocks a concurrent flush.
// Raw mode is the one exception to buffering: it is a device-mode
// syscall on the input stream and takes effect immediately.
//
// The input side (parser plus queued events) supports one logical
// consumer of `read_event` at a time.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use crate::ansi::{self, ClipboardTarget, MouseCapture};
use crate::capabilities::Capabilities;
use crate::input::{Event, EventParser};
use crate::scope::Scope;
use crate::style::Style;
use crate::tty::{self, InputSource, OutputSink, Size, TtyInput, TtyOutput};

/// Upper bound for a single input read. A keypress is 1-6 bytes, a
/// paste can be kilobytes; 4 KB handles both without waste.
const READ_CHUNK: usize = 4096;

// ─── OutputBuffer ───────────────────────────────────────────────────────────

/// A byte buffer that accumulates encoded output for a single write.
///
/// Cleared atomically on flush while the state lock is held. Writes
/// into the backing `Vec` cannot fail.
struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clear for reuse (keeps allocated capacity).
    fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing goes through Terminal::flush.
        Ok(())
    }
}

// ─── ModeState ──────────────────────────────────────────────────────────────

/// Tracked terminal modes. Every mode starts disabled except the
/// cursor, which terminals show by default.
struct ModeState {
    raw_mode: bool,
    alternate_screen: bool,
    bracketed_paste: bool,
    focus_events: bool,
    cursor_visible: bool,
    mouse_capture: Option<MouseCapture>,
    size: Option<Size>,
}

impl ModeState {
    const fn new() -> Self {
        Self {
            raw_mode: false,
            alternate_screen: false,
            bracketed_paste: false,
            focus_events: false,
            cursor_visible: true,
            mouse_capture: None,
            size: None,
        }
    }
}

/// Buffer and mode state, guarded together by one lock.
struct OutState {
    buffer: OutputBuffer,
    state: ModeState,
}

impl OutState {
    /// Append an encoded sequence to the buffer. The closure writes
    /// into the Vec-backed buffer, which cannot fail.
    fn append(&mut self, f: impl FnOnce(&mut OutputBuffer) -> io::Result<()>) {
        let _ = f(&mut self.buffer);
    }
}

/// Parser and queued events for the single `read_event` consumer.
struct DecodeState {
    parser: EventParser,
    queue: VecDeque<Event>,
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Buffered terminal with tracked modes and event input.
///
/// Owns exclusive use of one input stream and one output stream. All
/// methods take `&self`; the handle can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use vtio::Terminal;
///
/// let term = Terminal::stdio();
/// term.enable_raw_mode()?;
/// term.enter_alternate_screen().move_to(0, 0).print("hello");
/// term.flush()?;
/// // ...
/// term.close()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal<I: InputSource = TtyInput, O: OutputSink = TtyOutput> {
    input: I,
    output: O,
    out: Mutex<OutState>,
    decode: Mutex<DecodeState>,
    caps: OnceLock<Capabilities>,
    /// Whether SIGWINCH resize reporting is wired up (stdio only).
    winch: bool,
}

impl Terminal {
    /// A terminal over the process's stdin and stdout, with resize
    /// reporting wired to SIGWINCH.
    #[must_use]
    pub fn stdio() -> Self {
        tty::install_winch_handler();
        let mut term = Self::new(TtyInput::new(), TtyOutput);
        term.winch = true;
        term
    }
}

impl<I: InputSource, O: OutputSink> Terminal<I, O> {
    /// Build a terminal over arbitrary streams.
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            out: Mutex::new(OutState {
                buffer: OutputBuffer::new(),
                state: ModeState::new(),
            }),
            decode: Mutex::new(DecodeState {
                parser: EventParser::new(),
                queue: VecDeque::new(),
            }),
            caps: OnceLock::new(),
            winch: false,
        }
    }

    fn out_state(&self) -> MutexGuard<'_, OutState> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decode_state(&self) -> MutexGuard<'_, DecodeState> {
        self.decode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one encoded sequence under the lock.
    fn command(&self, f: impl FnOnce(&mut OutputBuffer) -> io::Result<()>) -> &Self {
        self.out_state().append(f);
        self
    }

    // ── Mode queries ────────────────────────────────────────────────

    #[must_use]
    pub fn raw_mode(&self) -> bool {
        self.out_state().state.raw_mode
    }

    #[must_use]
    pub fn alternate_screen(&self) -> bool {
        self.out_state().state.alternate_screen
    }

    #[must_use]
    pub fn bracketed_paste(&self) -> bool {
        self.out_state().state.bracketed_paste
    }

    #[must_use]
    pub fn focus_events(&self) -> bool {
        self.out_state().state.focus_events
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.out_state().state.cursor_visible
    }

    #[must_use]
    pub fn mouse_capture(&self) -> Option<MouseCapture> {
        self.out_state().state.mouse_capture
    }

    /// Whether both streams are terminal devices.
    #[must_use]
    pub fn is_tty(&self) -> bool {
        self.input.is_tty() && self.output.is_tty()
    }

    /// Detected terminal capabilities (cached after first use).
    pub fn capabilities(&self) -> Capabilities {
        *self.caps.get_or_init(Capabilities::detect)
    }

    // ── Raw mode (immediate OS switch, never buffered) ──────────────

    /// Switch the input device to raw mode.
    ///
    /// Idempotent, and a no-op when the input is not a terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the device-mode switch fails.
    pub fn enable_raw_mode(&self) -> io::Result<&Self> {
        let mut out = self.out_state();
        if !out.state.raw_mode && self.input.is_tty() {
            self.input.set_raw_mode(true)?;
            out.state.raw_mode = true;
        }
        Ok(self)
    }

    /// Restore the input device to cooked mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the device-mode switch fails.
    pub fn disable_raw_mode(&self) -> io::Result<&Self> {
        let mut out = self.out_state();
        if out.state.raw_mode && self.input.is_tty() {
            self.input.set_raw_mode(false)?;
            out.state.raw_mode = false;
        }
        Ok(self)
    }

    // ── Idempotent mode toggles (buffered) ──────────────────────────

    pub fn enter_alternate_screen(&self) -> &Self {
        let mut out = self.out_state();
        if !out.state.alternate_screen {
            out.append(|b| ansi::enter_alt_screen(b));
            out.state.alternate_screen = true;
        }
        self
    }

    pub fn leave_alternate_screen(&self) -> &Self {
        let mut out = self.out_state();
        if out.state.alternate_screen {
            out.append(|b| ansi::exit_alt_screen(b));
            out.state.alternate_screen = false;
        }
        self
    }

    pub fn enable_bracketed_paste(&self) -> &Self {
        let mut out = self.out_state();
        if !out.state.bracketed_paste {
            out.append(|b| ansi::enable_bracketed_paste(b));
            out.state.bracketed_paste = true;
        }
        self
    }

    pub fn disable_bracketed_paste(&self) -> &Self {
        let mut out = self.out_state();
        if out.state.bracketed_paste {
            out.append(|b| ansi::disable_bracketed_paste(b));
            out.state.bracketed_paste = false;
        }
        self
    }

    pub fn enable_focus_events(&self) -> &Self {
        let mut out = self.out_state();
        if !out.state.focus_events {
            out.append(|b| ansi::enable_focus_events(b));
            out.state.focus_events = true;
        }
        self
    }

    pub fn disable_focus_events(&self) -> &Self {
        let mut out = self.out_state();
        if out.state.focus_events {
            out.append(|b| ansi::disable_focus_events(b));
            out.state.focus_events = false;
        }
        self
    }

    pub fn show_cursor(&self) -> &Self {
        let mut out = self.out_state();
        if !out.state.cursor_visible {
            out.append(|b| ansi::cursor_show(b));
            out.state.cursor_visible = true;
        }
        self
    }

    pub fn hide_cursor(&self) -> &Self {
        let mut out = self.out_state();
        if out.state.cursor_visible {
            out.append(|b| ansi::cursor_hide(b));
            out.state.cursor_visible = false;
        }
        self
    }

    /// Enable mouse capture at the given granularity.
    ///
    /// Switching from one variant to another re-enables directly: the
    /// terminal treats tracking modes as a single setting, so no
    /// disable of the previous variant is emitted first.
    pub fn enable_mouse_capture(&self, mode: MouseCapture) -> &Self {
        let mut out = self.out_state();
        if out.state.mouse_capture != Some(mode) {
            out.append(|b| ansi::enable_mouse(b, mode));
            out.state.mouse_capture = Some(mode);
        }
        self
    }

    /// Disable mouse capture, emitting the active variant's disable pair.
    pub fn disable_mouse_capture(&self) -> &Self {
        let mut out = self.out_state();
        if let Some(mode) = out.state.mouse_capture {
            out.append(|b| ansi::disable_mouse(b, mode));
            out.state.mouse_capture = None;
        }
        self
    }

    // ── Cursor movement (stateless commands) ────────────────────────

    pub fn move_to(&self, row: u16, col: u16) -> &Self {
        self.command(|b| ansi::move_to(b, row, col))
    }

    pub fn move_up(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_up(b, n))
    }

    pub fn move_down(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_down(b, n))
    }

    pub fn move_forward(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_forward(b, n))
    }

    pub fn move_back(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_back(b, n))
    }

    pub fn move_to_next_line(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_to_next_line(b, n))
    }

    pub fn move_to_prev_line(&self, n: u16) -> &Self {
        self.command(|b| ansi::move_to_prev_line(b, n))
    }

    pub fn move_to_column(&self, col: u16) -> &Self {
        self.command(|b| ansi::move_to_column(b, col))
    }

    pub fn move_to_row(&self, row: u16) -> &Self {
        self.command(|b| ansi::move_to_row(b, row))
    }

    pub fn move_home(&self) -> &Self {
        self.command(|b| ansi::move_home(b))
    }

    pub fn save_cursor(&self) -> &Self {
        self.command(|b| ansi::save_cursor(b))
    }

    pub fn restore_cursor(&self) -> &Self {
        self.command(|b| ansi::restore_cursor(b))
    }

    // ── Clearing, scrolling, editing ────────────────────────────────

    pub fn clear(&self) -> &Self {
        self.command(|b| ansi::clear(b))
    }

    pub fn clear_below(&self) -> &Self {
        self.command(|b| ansi::clear_below(b))
    }

    pub fn clear_above(&self) -> &Self {
        self.command(|b| ansi::clear_above(b))
    }

    pub fn clear_line(&self) -> &Self {
        self.command(|b| ansi::clear_line(b))
    }

    pub fn clear_line_right(&self) -> &Self {
        self.command(|b| ansi::clear_line_right(b))
    }

    pub fn clear_line_left(&self) -> &Self {
        self.command(|b| ansi::clear_line_left(b))
    }

    pub fn scroll_up(&self, n: u16) -> &Self {
        self.command(|b| ansi::scroll_up(b, n))
    }

    pub fn scroll_down(&self, n: u16) -> &Self {
        self.command(|b| ansi::scroll_down(b, n))
    }

    pub fn set_scroll_region(&self, top: u16, bottom: u16) -> &Self {
        self.command(|b| ansi::set_scroll_region(b, top, bottom))
    }

    pub fn reset_scroll_region(&self) -> &Self {
        self.command(|b| ansi::reset_scroll_region(b))
    }

    pub fn insert_lines(&self, n: u16) -> &Self {
        self.command(|b| ansi::insert_lines(b, n))
    }

    pub fn delete_lines(&self, n: u16) -> &Self {
        self.command(|b| ansi::delete_lines(b, n))
    }

    pub fn insert_chars(&self, n: u16) -> &Self {
        self.command(|b| ansi::insert_chars(b, n))
    }

    pub fn delete_chars(&self, n: u16) -> &Self {
        self.command(|b| ansi::delete_chars(b, n))
    }

    pub fn erase_chars(&self, n: u16) -> &Self {
        self.command(|b| ansi::erase_chars(b, n))
    }

    // ── OSC commands ────────────────────────────────────────────────

    pub fn title(&self, text: &str) -> &Self {
        self.command(|b| ansi::title(b, text))
    }

    pub fn icon_name(&self, text: &str) -> &Self {
        self.command(|b| ansi::icon_name(b, text))
    }

    pub fn bell(&self) -> &Self {
        self.command(|b| ansi::bell(b))
    }

    pub fn notify(&self, title: &str, body: Option<&str>) -> &Self {
        self.command(|b| ansi::notify(b, title, body))
    }

    pub fn copy_to_clipboard(&self, text: &str, target: ClipboardTarget) -> &Self {
        self.command(|b| ansi::copy_to_clipboard(b, text, target))
    }

    pub fn hyperlink(&self, url: &str, text: &str) -> &Self {
        self.command(|b| ansi::hyperlink(b, url, text, None))
    }

    pub fn hyperlink_start(&self, url: &str) -> &Self {
        self.command(|b| ansi::hyperlink_start(b, url, None))
    }

    pub fn hyperlink_end(&self) -> &Self {
        self.command(|b| ansi::hyperlink_end(b))
    }

    // ── Text output ─────────────────────────────────────────────────

    /// Append raw text to the output buffer. Returns the byte count.
    pub fn write(&self, text: &str) -> usize {
        self.command(|b| b.write_all(text.as_bytes()));
        text.len()
    }

    /// Append text to the output buffer.
    pub fn print(&self, text: &str) -> &Self {
        self.write(text);
        self
    }

    /// Append style-wrapped text: SGR prefix, text, reset. An empty
    /// style appends the text alone, with no stray reset.
    pub fn print_styled(&self, text: &str, style: &Style) -> &Self {
        if style.is_empty() {
            return self.print(text);
        }
        let mut out = self.out_state();
        out.append(|b| write!(b, "{style}{text}"));
        out.append(|b| ansi::reset_style(b));
        self
    }

    /// Append text followed by a newline.
    pub fn puts(&self, text: &str) -> &Self {
        let mut out = self.out_state();
        out.append(|b| b.write_all(text.as_bytes()));
        out.append(|b| b.write_all(b"\n"));
        self
    }

    /// Append style-wrapped text followed by a newline.
    pub fn puts_styled(&self, text: &str, style: &Style) -> &Self {
        if style.is_empty() {
            return self.puts(text);
        }
        let mut out = self.out_state();
        out.append(|b| write!(b, "{style}{text}"));
        out.append(|b| ansi::reset_style(b));
        out.append(|b| b.write_all(b"\n"));
        self
    }

    // ── Flushing ────────────────────────────────────────────────────

    /// Write the buffered output to the sink in one call and clear the
    /// buffer. A no-op when the buffer is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the write; the buffer is
    /// left intact in that case.
    pub fn flush(&self) -> io::Result<()> {
        let mut out = self.out_state();
        if out.buffer.is_empty() {
            return Ok(());
        }
        self.output.write_all(out.buffer.as_bytes())?;
        self.output.flush()?;
        out.buffer.clear();
        Ok(())
    }

    /// Run `f` inside a synchronized-update block.
    ///
    /// The end-synchronized-update sequence and a flush happen
    /// unconditionally — on success, on error, and (via a drop guard)
    /// on panic — so the terminal is never left buffering forever.
    ///
    /// # Errors
    ///
    /// Propagates the body's error after cleanup, then any flush error.
    pub fn sync<T>(&self, f: impl FnOnce(&Self) -> io::Result<T>) -> io::Result<T> {
        self.command(|b| ansi::begin_sync(b));

        let mut guard = EndSyncGuard {
            term: self,
            armed: true,
        };
        let result = f(self);
        guard.armed = false;
        drop(guard);

        self.command(|b| ansi::end_sync(b));
        let flushed = self.flush();
        let value = result?;
        flushed?;
        Ok(value)
    }

    /// Run `f` between a cursor save and restore.
    ///
    /// # Errors
    ///
    /// Propagates the body's error after the cursor restore.
    pub fn with_cursor<T>(&self, f: impl FnOnce(&Self) -> io::Result<T>) -> io::Result<T> {
        self.command(|b| ansi::save_cursor(b));

        let mut guard = RestoreCursorGuard {
            term: self,
            armed: true,
        };
        let result = f(self);
        guard.armed = false;
        drop(guard);

        self.command(|b| ansi::restore_cursor(b));
        result
    }

    // ── Size ────────────────────────────────────────────────────────

    /// Terminal size, queried from the sink on first use and cached.
    pub fn size(&self) -> Option<Size> {
        let mut out = self.out_state();
        if out.state.size.is_none() {
            out.state.size = self.output.size();
        }
        out.state.size
    }

    /// Re-query the size from the sink, replacing the cached value.
    pub fn refresh_size(&self) -> Option<Size> {
        let queried = self.output.size();
        let mut out = self.out_state();
        if queried.is_some() {
            out.state.size = queried;
        }
        out.state.size
    }

    /// Override the cached size (useful when the size is known
    /// out-of-band, or for streams that cannot report one).
    pub fn resize(&self, rows: u16, cols: u16) -> &Self {
        self.out_state().state.size = Some(Size { rows, cols });
        self
    }

    // ── Event input ─────────────────────────────────────────────────

    /// Read the next input event.
    ///
    /// Returns a queued event if one is ready; otherwise waits for
    /// input readiness, reads up to 4 KB, and feeds the parser. When
    /// the parser is left holding an ambiguous prefix, the wait is
    /// capped at [`EventParser::ESC_TIMEOUT`] and the prefix is then
    /// force-resolved, so a lone Escape keypress is delivered promptly.
    ///
    /// `timeout: None` waits indefinitely. An elapsed deadline returns
    /// `Ok(None)` — a timeout is a defined result, not an error.
    /// End-of-stream and interrupted reads count as "no bytes yet".
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream fails.
    pub fn read_event(&self, timeout: Option<Duration>) -> io::Result<Option<Event>> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if self.winch && tty::take_winch() {
                if let Some(size) = self.refresh_size() {
                    self.decode_state().queue.push_back(Event::Resize {
                        rows: size.rows,
                        cols: size.cols,
                    });
                }
            }

            if let Some(event) = self.decode_state().queue.pop_front() {
                return Ok(Some(event));
            }

            if !self.wait_for_input(deadline)? {
                return Ok(None);
            }

            let mut buf = [0u8; READ_CHUNK];
            let n = match self.input.read_available(&mut buf) {
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                            | io::ErrorKind::UnexpectedEof
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                continue;
            }

            let mut decode = self.decode_state();
            let events = decode.parser.feed(&buf[..n]);
            decode.queue.extend(events);
        }
    }

    /// One readiness wait. Returns `false` when the deadline is spent.
    ///
    /// While the parser holds an ambiguous prefix, the wait is capped
    /// at the escape timeout; on expiry the prefix is flushed into the
    /// queue and the loop continues if that produced events or time
    /// remains.
    fn wait_for_input(&self, deadline: Option<Instant>) -> io::Result<bool> {
        let pending = self.decode_state().parser.pending();

        if pending {
            let mut wait = EventParser::ESC_TIMEOUT;
            if let Some(d) = deadline {
                wait = wait.min(d.saturating_duration_since(Instant::now()));
            }

            if wait.is_zero() || !self.input.wait_readable(Some(wait))? {
                let mut decode = self.decode_state();
                let events = decode.parser.flush();
                let produced = !events.is_empty();
                decode.queue.extend(events);
                drop(decode);
                return Ok(produced || deadline.is_none_or(|d| Instant::now() < d));
            }
            return Ok(true);
        }

        match deadline {
            Some(d) => {
                let now = Instant::now();
                if now >= d {
                    return Ok(false);
                }
                self.input.wait_readable(Some(d - now))
            }
            None => self.input.wait_readable(None),
        }
    }

    /// Blocking iterator over input events.
    pub fn events(&self) -> Events<'_, I, O> {
        Events { term: self }
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Disable every enabled mode in a fixed order and flush:
    /// focus events, bracketed paste, mouse capture, cursor back to
    /// visible, alternate screen off, raw mode off.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw-mode switch or the flush fails.
    pub fn reset(&self) -> io::Result<()> {
        self.disable_focus_events();
        self.disable_bracketed_paste();
        self.disable_mouse_capture();
        self.show_cursor();
        self.leave_alternate_screen();
        self.disable_raw_mode()?;
        self.flush()
    }

    /// Restore the terminal. The streams themselves stay open — they
    /// are borrowed, not owned.
    ///
    /// # Errors
    ///
    /// Returns an error if restoring terminal state fails.
    pub fn close(&self) -> io::Result<()> {
        self.reset()
    }

    /// Begin a scoped mode block; see [`Scope`].
    pub fn scoped(&self) -> Scope<'_, I, O> {
        Scope::new(self)
    }
}

impl<I: InputSource, O: OutputSink> Drop for Terminal<I, O> {
    fn drop(&mut self) {
        // Best effort: a terminal with nothing enabled writes nothing.
        let _ = self.reset();
    }
}

/// Emits end-synchronized-update and flushes if `sync` unwinds.
struct EndSyncGuard<'a, I: InputSource, O: OutputSink> {
    term: &'a Terminal<I, O>,
    armed: bool,
}

impl<I: InputSource, O: OutputSink> Drop for EndSyncGuard<'_, I, O> {
    fn drop(&mut self) {
        if self.armed {
            self.term.command(|b| ansi::end_sync(b));
            let _ = self.term.flush();
        }
    }
}

/// Restores the cursor if `with_cursor` unwinds.
struct RestoreCursorGuard<'a, I: InputSource, O: OutputSink> {
    term: &'a Terminal<I, O>,
    armed: bool,
}

impl<I: InputSource, O: OutputSink> Drop for RestoreCursorGuard<'_, I, O> {
    fn drop(&mut self) {
        if self.armed {
            self.term.command(|b| ansi::restore_cursor(b));
        }
    }
}

/// Blocking event iterator returned by [`Terminal::events`].
///
/// Ends when a read fails or an indefinite wait reports no input
/// (end of stream).
pub struct Events<'a, I: InputSource, O: OutputSink> {
    term: &'a Terminal<I, O>,
}

impl<I: InputSource, O: OutputSink> Iterator for Events<'_, I, O> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.term.read_event(None).ok().flatten()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, NamedColor};
    use crate::input::{KeyCode, KeyEvent, Modifiers, MouseButton, MouseKind};
    use crate::tty::doubles::{CapturedOutput, ClosedOutput, ScriptedInput};
    use pretty_assertions::assert_eq;

    fn term() -> (Terminal<ScriptedInput, CapturedOutput>, CapturedOutput) {
        term_with_input(&[])
    }

    fn term_with_input(
        chunks: &[&[u8]],
    ) -> (Terminal<ScriptedInput, CapturedOutput>, CapturedOutput) {
        let sink = CapturedOutput::new();
        let term = Terminal::new(ScriptedInput::new(chunks), sink.clone());
        (term, sink)
    }

    fn char_key(c: char) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: Modifiers::empty(),
        })
    }

    const SHORT: Option<Duration> = Some(Duration::from_millis(50));

    // ── Buffering & flushing ────────────────────────────────────────

    #[test]
    fn print_buffers_until_flush() {
        let (term, sink) = term();
        term.print("hello");
        assert_eq!(sink.string(), "");

        term.flush().unwrap();
        assert_eq!(sink.string(), "hello");
    }

    #[test]
    fn flush_clears_buffer() {
        let (term, sink) = term();
        term.print("hello");
        term.flush().unwrap();
        term.flush().unwrap();
        assert_eq!(sink.string(), "hello");
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn flush_on_empty_buffer_is_noop() {
        let (term, sink) = term();
        term.flush().unwrap();
        assert_eq!(sink.string(), "");
        assert_eq!(sink.flush_count(), 0);
    }

    #[test]
    fn flush_error_propagates_and_keeps_buffer() {
        let term = Terminal::new(ScriptedInput::empty(), ClosedOutput);
        term.print("data");
        assert!(term.flush().is_err());
        // Buffer kept: a second flush still attempts (and fails).
        assert!(term.flush().is_err());
    }

    #[test]
    fn write_returns_byte_count() {
        let (term, _sink) = term();
        assert_eq!(term.write("héllo"), 6);
    }

    #[test]
    fn chaining() {
        let (term, sink) = term();
        term.print("a").print("b").print("c");
        term.flush().unwrap();
        assert_eq!(sink.string(), "abc");
    }

    #[test]
    fn puts_appends_newline() {
        let (term, sink) = term();
        term.puts("hello");
        term.flush().unwrap();
        assert_eq!(sink.string(), "hello\n");
    }

    #[test]
    fn puts_empty_is_bare_newline() {
        let (term, sink) = term();
        term.puts("");
        term.flush().unwrap();
        assert_eq!(sink.string(), "\n");
    }

    // ── Styled output ───────────────────────────────────────────────

    #[test]
    fn print_styled_wraps_with_reset() {
        let (term, sink) = term();
        let style = Style::new().fg(Color::Named(NamedColor::Red));
        term.print_styled("hello", &style);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[31mhello\x1b[0m");
    }

    #[test]
    fn print_styled_bold_blue() {
        let (term, sink) = term();
        let style = Style::new().fg(Color::Named(NamedColor::Blue)).bold();
        term.print_styled("hello", &style);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[1;34mhello\x1b[0m");
    }

    #[test]
    fn print_styled_empty_style_has_no_reset() {
        let (term, sink) = term();
        term.print_styled("plain", &Style::new());
        term.flush().unwrap();
        assert_eq!(sink.string(), "plain");
    }

    #[test]
    fn puts_styled_wraps_before_newline() {
        let (term, sink) = term();
        let style = Style::new().bold();
        term.puts_styled("x", &style);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[1mx\x1b[0m\n");
    }

    // ── Cursor & screen commands ────────────────────────────────────

    #[test]
    fn move_to_is_one_based_on_the_wire() {
        let (term, sink) = term();
        term.move_to(5, 10);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[6;11H");
    }

    #[test]
    fn relative_moves() {
        let (term, sink) = term();
        term.move_up(3).move_down(2).move_forward(5).move_back(4);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[3A\x1b[2B\x1b[5C\x1b[4D");
    }

    #[test]
    fn move_home_sequence() {
        let (term, sink) = term();
        term.move_home();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[H");
    }

    #[test]
    fn save_restore_cursor() {
        let (term, sink) = term();
        term.save_cursor().restore_cursor();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b7\x1b8");
    }

    #[test]
    fn with_cursor_wraps_body() {
        let (term, sink) = term();
        term.with_cursor(|t| {
            t.move_to(0, 0);
            Ok(())
        })
        .unwrap();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b7\x1b[1;1H\x1b8");
    }

    #[test]
    fn with_cursor_restores_on_error() {
        let (term, sink) = term();
        let result: io::Result<()> =
            term.with_cursor(|_| Err(io::Error::other("boom")));
        assert!(result.is_err());
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b7\x1b8");
    }

    #[test]
    fn clears() {
        let (term, sink) = term();
        term.clear().clear_line();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[2J\x1b[2K");
    }

    #[test]
    fn scrolling_and_region() {
        let (term, sink) = term();
        term.scroll_up(5).scroll_down(3).set_scroll_region(0, 23);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[5S\x1b[3T\x1b[1;24r");
    }

    // ── OSC commands ────────────────────────────────────────────────

    #[test]
    fn title_sequence() {
        let (term, sink) = term();
        term.title("My App");
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b]2;My App\x1b\\");
    }

    #[test]
    fn bell_byte() {
        let (term, sink) = term();
        term.bell();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x07");
    }

    #[test]
    fn hyperlink_wraps_text() {
        let (term, sink) = term();
        term.hyperlink("https://example.com", "click");
        term.flush().unwrap();
        assert_eq!(
            sink.string(),
            "\x1b]8;;https://example.com\x1b\\click\x1b]8;;\x1b\\"
        );
    }

    // ── Mode toggles ────────────────────────────────────────────────

    #[test]
    fn alternate_screen_state_tracks() {
        let (term, _sink) = term();
        assert!(!term.alternate_screen());
        term.enter_alternate_screen();
        assert!(term.alternate_screen());
        term.leave_alternate_screen();
        assert!(!term.alternate_screen());
    }

    #[test]
    fn alternate_screen_enter_is_idempotent() {
        let (term, sink) = term();
        term.enter_alternate_screen();
        term.flush().unwrap();
        sink.clear();

        term.enter_alternate_screen();
        term.flush().unwrap();
        assert_eq!(sink.string(), "");
        assert!(term.alternate_screen());
    }

    #[test]
    fn leave_alternate_screen_without_enter_writes_nothing() {
        let (term, sink) = term();
        term.leave_alternate_screen();
        term.flush().unwrap();
        assert_eq!(sink.string(), "");
    }

    #[test]
    fn cursor_starts_visible() {
        let (term, sink) = term();
        assert!(term.cursor_visible());

        // show_cursor while visible appends nothing.
        term.show_cursor();
        term.flush().unwrap();
        assert_eq!(sink.string(), "");
    }

    #[test]
    fn hide_show_cursor_sequences() {
        let (term, sink) = term();
        term.hide_cursor();
        assert!(!term.cursor_visible());
        term.hide_cursor(); // idempotent
        term.show_cursor();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[?25l\x1b[?25h");
    }

    #[test]
    fn bracketed_paste_toggle() {
        let (term, sink) = term();
        term.enable_bracketed_paste();
        assert!(term.bracketed_paste());
        term.enable_bracketed_paste(); // idempotent
        term.disable_bracketed_paste();
        assert!(!term.bracketed_paste());
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[?2004h\x1b[?2004l");
    }

    #[test]
    fn focus_events_toggle() {
        let (term, sink) = term();
        term.enable_focus_events();
        assert!(term.focus_events());
        term.disable_focus_events();
        assert!(!term.focus_events());
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[?1004h\x1b[?1004l");
    }

    #[test]
    fn mouse_capture_state_tracks_variant() {
        let (term, _sink) = term();
        assert_eq!(term.mouse_capture(), None);
        term.enable_mouse_capture(MouseCapture::Normal);
        assert_eq!(term.mouse_capture(), Some(MouseCapture::Normal));
        term.disable_mouse_capture();
        assert_eq!(term.mouse_capture(), None);
    }

    #[test]
    fn mouse_capture_same_variant_is_idempotent() {
        let (term, sink) = term();
        term.enable_mouse_capture(MouseCapture::Normal);
        term.enable_mouse_capture(MouseCapture::Normal);
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[?1000h\x1b[?1006h");
    }

    #[test]
    fn mouse_capture_switch_reenables_without_disable() {
        let (term, sink) = term();
        term.enable_mouse_capture(MouseCapture::Normal);
        term.enable_mouse_capture(MouseCapture::Button);
        term.flush().unwrap();
        assert_eq!(
            sink.string(),
            "\x1b[?1000h\x1b[?1006h\x1b[?1002h\x1b[?1006h"
        );
        assert_eq!(term.mouse_capture(), Some(MouseCapture::Button));
    }

    #[test]
    fn mouse_disable_uses_active_variant() {
        let (term, sink) = term();
        term.enable_mouse_capture(MouseCapture::All);
        term.flush().unwrap();
        sink.clear();

        term.disable_mouse_capture();
        term.flush().unwrap();
        assert_eq!(sink.string(), "\x1b[?1003l\x1b[?1006l");
    }

    #[test]
    fn raw_mode_switches_device_immediately() {
        let sink = CapturedOutput::new();
        let input = ScriptedInput::empty();
        let term = Terminal::new(input, sink.clone());

        term.enable_raw_mode().unwrap();
        assert!(term.raw_mode());
        assert!(term.input.raw_mode());
        // No bytes buffered: raw mode is a syscall, not a sequence.
        assert_eq!(sink.string(), "");
        term.flush().unwrap();
        assert_eq!(sink.string(), "");

        term.disable_raw_mode().unwrap();
        assert!(!term.raw_mode());
        assert!(!term.input.raw_mode());
    }

    // ── Synchronized updates ────────────────────────────────────────

    #[test]
    fn sync_wraps_and_flushes() {
        let (term, sink) = term();
        term.sync(|t| {
            t.print("hello");
            Ok(())
        })
        .unwrap();

        let output = sink.string();
        assert!(output.starts_with("\x1b[?2026h"));
        assert!(output.contains("hello"));
        assert!(output.ends_with("\x1b[?2026l"));
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn sync_body_error_still_ends_and_flushes() {
        let (term, sink) = term();
        let result: io::Result<()> = term.sync(|t| {
            t.print("partial");
            Err(io::Error::other("boom"))
        });

        assert!(result.is_err());
        let output = sink.string();
        assert!(output.ends_with("\x1b[?2026l"));
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn sync_returns_body_value() {
        let (term, _sink) = term();
        let value = term.sync(|_| Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    // ── Size ────────────────────────────────────────────────────────

    #[test]
    fn size_queried_from_sink_and_cached() {
        let (term, _sink) = term();
        assert_eq!(term.size(), Some(Size { rows: 24, cols: 80 }));
    }

    #[test]
    fn resize_overrides_cached_size() {
        let (term, _sink) = term();
        term.resize(40, 120);
        assert_eq!(term.size(), Some(Size { rows: 40, cols: 120 }));
    }

    #[test]
    fn refresh_size_requeries_sink() {
        let (term, _sink) = term();
        term.resize(40, 120);
        assert_eq!(term.refresh_size(), Some(Size { rows: 24, cols: 80 }));
    }

    // ── Reset ───────────────────────────────────────────────────────

    #[test]
    fn reset_restores_all_state() {
        let (term, _sink) = term();
        term.enter_alternate_screen();
        term.hide_cursor();
        term.enable_mouse_capture(MouseCapture::Normal);
        term.enable_bracketed_paste();
        term.enable_focus_events();
        term.enable_raw_mode().unwrap();

        term.reset().unwrap();

        assert!(!term.alternate_screen());
        assert!(term.cursor_visible());
        assert_eq!(term.mouse_capture(), None);
        assert!(!term.bracketed_paste());
        assert!(!term.focus_events());
        assert!(!term.raw_mode());
    }

    #[test]
    fn reset_disables_in_fixed_order() {
        let (term, sink) = term();
        term.enter_alternate_screen();
        term.hide_cursor();
        term.enable_mouse_capture(MouseCapture::Normal);
        term.enable_bracketed_paste();
        term.enable_focus_events();
        term.flush().unwrap();
        sink.clear();

        term.reset().unwrap();
        assert_eq!(
            sink.string(),
            "\x1b[?1004l\x1b[?2004l\x1b[?1000l\x1b[?1006l\x1b[?25h\x1b[?1049l"
        );
    }

    #[test]
    fn reset_on_clean_terminal_writes_nothing() {
        let (term, sink) = term();
        term.reset().unwrap();
        assert_eq!(sink.string(), "");
        assert_eq!(sink.flush_count(), 0);
    }

    // ── Event reading ───────────────────────────────────────────────

    #[test]
    fn read_event_simple_char() {
        let (term, _sink) = term_with_input(&[b"a"]);
        assert_eq!(term.read_event(SHORT).unwrap(), Some(char_key('a')));
    }

    #[test]
    fn read_event_arrow_key() {
        let (term, _sink) = term_with_input(&[b"\x1b[A"]);
        assert_eq!(
            term.read_event(SHORT).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Up,
                modifiers: Modifiers::empty(),
            }))
        );
    }

    #[test]
    fn read_event_queues_extra_events() {
        let (term, _sink) = term_with_input(&[b"abc"]);
        assert_eq!(term.read_event(SHORT).unwrap(), Some(char_key('a')));
        assert_eq!(term.read_event(SHORT).unwrap(), Some(char_key('b')));
        assert_eq!(term.read_event(SHORT).unwrap(), Some(char_key('c')));
    }

    #[test]
    fn read_event_timeout_returns_none() {
        let (term, _sink) = term();
        assert_eq!(term.read_event(Some(Duration::from_millis(5))).unwrap(), None);
    }

    #[test]
    fn read_event_lone_escape_resolves_via_flush() {
        let (term, _sink) = term_with_input(&[b"\x1b"]);
        assert_eq!(
            term.read_event(SHORT).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Escape,
                modifiers: Modifiers::empty(),
            }))
        );
    }

    #[test]
    fn read_event_escape_sequence_split_across_reads() {
        let (term, _sink) = term_with_input(&[b"\x1b", b"[A"]);
        assert_eq!(
            term.read_event(SHORT).unwrap(),
            Some(Event::Key(KeyEvent {
                code: KeyCode::Up,
                modifiers: Modifiers::empty(),
            }))
        );
    }

    #[test]
    fn read_event_mouse() {
        let (term, _sink) = term_with_input(&[b"\x1b[<0;10;20M"]);
        let event = term.read_event(SHORT).unwrap().unwrap();
        let Event::Mouse(mouse) = event else {
            panic!("expected mouse event, got {event:?}");
        };
        assert_eq!(mouse.kind, MouseKind::Press);
        assert_eq!(mouse.button, MouseButton::Left);
        assert_eq!(mouse.row, 19);
        assert_eq!(mouse.col, 9);
    }

    #[test]
    fn read_event_paste() {
        let (term, _sink) = term_with_input(&[b"\x1b[200~hello world\x1b[201~"]);
        assert_eq!(
            term.read_event(SHORT).unwrap(),
            Some(Event::Paste("hello world".into()))
        );
    }

    #[test]
    fn read_event_paste_split_across_reads() {
        let (term, _sink) = term_with_input(&[b"\x1b[200~hel", b"lo\x1b[201~"]);
        assert_eq!(
            term.read_event(SHORT).unwrap(),
            Some(Event::Paste("hello".into()))
        );
    }

    #[test]
    fn read_event_focus() {
        let (term, _sink) = term_with_input(&[b"\x1b[I"]);
        assert_eq!(term.read_event(SHORT).unwrap(), Some(Event::Focus(true)));
    }

    #[test]
    fn read_event_skips_unknown_sequences() {
        let (term, _sink) = term_with_input(&[b"\x1b[999z", b"a"]);
        assert_eq!(term.read_event(SHORT).unwrap(), Some(char_key('a')));
    }

    #[test]
    fn events_iterator_drains_input() {
        let (term, _sink) = term_with_input(&[b"ab"]);
        let events: Vec<Event> = term.events().collect();
        assert_eq!(events, [char_key('a'), char_key('b')]);
    }

    // ── Concurrency ─────────────────────────────────────────────────

    #[test]
    fn concurrent_writers_and_flushers_do_not_lose_bytes() {
        let (term, sink) = term();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        term.print("x");
                        term.flush().unwrap();
                    }
                });
            }
        });

        term.flush().unwrap();
        assert_eq!(sink.string().len(), 1000);
    }

    #[test]
    fn reader_does_not_block_concurrent_flush() {
        // A reader parked on an empty input must not hold the output
        // lock: the flush below has to complete while the read's
        // timeout is still running.
        let (term, sink) = term();

        std::thread::scope(|s| {
            let reader = s.spawn(|| term.read_event(Some(Duration::from_millis(100))));

            term.print("while reading");
            term.flush().unwrap();
            assert_eq!(sink.string(), "while reading");

            assert_eq!(reader.join().unwrap().unwrap(), None);
        });
    }
}

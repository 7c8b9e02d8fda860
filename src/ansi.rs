// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — that's the `Terminal`'s job.
// This module just knows the byte-level encoding of every terminal
// command we need.
//
// All cursor positions are 0-indexed in our API and converted to
// 1-indexed for the terminal (ANSI uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying
// writer. In practice they never fail when writing to the terminal's
// internal buffer (backed by a Vec).

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::style::Style;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position) sequence.
#[inline]
pub fn move_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// Move the cursor up `n` rows (CUU).
#[inline]
pub fn move_up(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}A")
}

/// Move the cursor down `n` rows (CUD).
#[inline]
pub fn move_down(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}B")
}

/// Move the cursor forward `n` columns (CUF).
#[inline]
pub fn move_forward(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}C")
}

/// Move the cursor back `n` columns (CUB).
#[inline]
pub fn move_back(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}D")
}

/// Move to the first column, `n` rows down (CNL).
#[inline]
pub fn move_to_next_line(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}E")
}

/// Move to the first column, `n` rows up (CPL).
#[inline]
pub fn move_to_prev_line(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}F")
}

/// Move to an absolute column on the current row (CHA).
#[inline]
pub fn move_to_column(w: &mut impl Write, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{}G", col + 1)
}

/// Move to an absolute row in the current column (VPA).
#[inline]
pub fn move_to_row(w: &mut impl Write, row: u16) -> io::Result<()> {
    write!(w, "\x1b[{}d", row + 1)
}

/// Move the cursor to the top-left corner.
#[inline]
pub fn move_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Save the cursor position and attributes (DECSC).
#[inline]
pub fn save_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b7")
}

/// Restore the cursor saved by [`save_cursor`] (DECRC).
#[inline]
pub fn restore_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b8")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear from the cursor to the end of the screen (ED 0).
#[inline]
pub fn clear_below(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0J")
}

/// Clear from the start of the screen to the cursor (ED 1).
#[inline]
pub fn clear_above(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[1J")
}

/// Clear the current line (EL 2).
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2K")
}

/// Clear from the cursor to the end of the line (EL 0).
#[inline]
pub fn clear_line_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0K")
}

/// Clear from the start of the line to the cursor (EL 1).
#[inline]
pub fn clear_line_left(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[1K")
}

// ─── Scrolling & Editing ─────────────────────────────────────────────────────

/// Scroll the scroll region up `n` lines (SU).
#[inline]
pub fn scroll_up(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}S")
}

/// Scroll the scroll region down `n` lines (SD).
#[inline]
pub fn scroll_down(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}T")
}

/// Restrict scrolling to rows `top..=bottom` (DECSTBM).
#[inline]
pub fn set_scroll_region(w: &mut impl Write, top: u16, bottom: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}r", top + 1, bottom + 1)
}

/// Reset the scroll region to the full screen.
#[inline]
pub fn reset_scroll_region(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[r")
}

/// Insert `n` blank lines at the cursor (IL).
#[inline]
pub fn insert_lines(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}L")
}

/// Delete `n` lines at the cursor (DL).
#[inline]
pub fn delete_lines(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}M")
}

/// Insert `n` blank characters at the cursor (ICH).
#[inline]
pub fn insert_chars(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}@")
}

/// Delete `n` characters at the cursor (DCH).
#[inline]
pub fn delete_chars(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}P")
}

/// Erase `n` characters at the cursor without shifting (ECH).
#[inline]
pub fn erase_chars(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}X")
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset_style(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Emit a style's full SGR sequence. Empty styles emit nothing.
#[inline]
pub fn style(w: &mut impl Write, style: &Style) -> io::Result<()> {
    write!(w, "{style}")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC Private Mode 2026).
///
/// The terminal buffers subsequent output until [`end_sync`], so a
/// partially-written update is never displayed.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output — the terminal renders the buffered update.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC Private Mode 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Mouse Capture ──────────────────────────────────────────────────────────

/// Mouse tracking granularity.
///
/// All variants use SGR encoding (DEC 1006), which supports coordinates
/// beyond column 223 and distinguishes press from release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseCapture {
    /// Button presses and releases (DEC 1000).
    Normal,
    /// Button events plus drag motion (DEC 1002).
    Button,
    /// All motion, even with no button held (DEC 1003).
    All,
}

/// Enable mouse tracking at the given granularity.
pub fn enable_mouse(w: &mut impl Write, mode: MouseCapture) -> io::Result<()> {
    match mode {
        MouseCapture::Normal => w.write_all(b"\x1b[?1000h\x1b[?1006h"),
        MouseCapture::Button => w.write_all(b"\x1b[?1002h\x1b[?1006h"),
        MouseCapture::All => w.write_all(b"\x1b[?1003h\x1b[?1006h"),
    }
}

/// Disable mouse tracking for the given granularity.
pub fn disable_mouse(w: &mut impl Write, mode: MouseCapture) -> io::Result<()> {
    match mode {
        MouseCapture::Normal => w.write_all(b"\x1b[?1000l\x1b[?1006l"),
        MouseCapture::Button => w.write_all(b"\x1b[?1002l\x1b[?1006l"),
        MouseCapture::All => w.write_all(b"\x1b[?1003l\x1b[?1006l"),
    }
}

// ─── Bracketed Paste ────────────────────────────────────────────────────────

/// Enable bracketed paste mode (DEC 2004).
///
/// Pasted text arrives wrapped in `ESC[200~` / `ESC[201~`, letting the
/// application distinguish typed input from clipboard paste.
#[inline]
pub fn enable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004h")
}

/// Disable bracketed paste mode.
#[inline]
pub fn disable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004l")
}

// ─── Focus Reporting ────────────────────────────────────────────────────────

/// Enable terminal focus reporting (DEC 1004).
///
/// The terminal sends `ESC[I` on focus gain and `ESC[O` on focus loss.
#[inline]
pub fn enable_focus_events(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004h")
}

/// Disable terminal focus reporting.
#[inline]
pub fn disable_focus_events(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004l")
}

// ─── OSC: Window & Notifications ────────────────────────────────────────────

/// Set the terminal window title (OSC 2, ST terminated).
pub fn title(w: &mut impl Write, text: &str) -> io::Result<()> {
    write!(w, "\x1b]2;{}\x1b\\", sanitize_osc(text))
}

/// Set the terminal icon name (OSC 1, ST terminated).
pub fn icon_name(w: &mut impl Write, text: &str) -> io::Result<()> {
    write!(w, "\x1b]1;{}\x1b\\", sanitize_osc(text))
}

/// Ring the terminal bell.
#[inline]
pub fn bell(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x07")
}

/// Post a desktop notification (OSC 777, rxvt-unicode extension).
pub fn notify(w: &mut impl Write, title: &str, body: Option<&str>) -> io::Result<()> {
    match body {
        Some(body) => write!(
            w,
            "\x1b]777;notify;{};{}\x1b\\",
            sanitize_osc(title),
            sanitize_osc(body)
        ),
        None => write!(w, "\x1b]777;notify;{}\x1b\\", sanitize_osc(title)),
    }
}

// ─── OSC 52: Clipboard ──────────────────────────────────────────────────────

/// Which selection an OSC 52 clipboard write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipboardTarget {
    /// The system clipboard.
    #[default]
    Clipboard,
    /// The X11 primary selection.
    Primary,
    /// Both clipboard and primary selection.
    Both,
}

impl ClipboardTarget {
    const fn code(self) -> &'static str {
        match self {
            Self::Clipboard => "c",
            Self::Primary => "p",
            Self::Both => "cp",
        }
    }
}

/// Copy text into the selection via OSC 52. The payload is base64.
pub fn copy_to_clipboard(w: &mut impl Write, text: &str, target: ClipboardTarget) -> io::Result<()> {
    write!(
        w,
        "\x1b]52;{};{}\x1b\\",
        target.code(),
        BASE64.encode(text.as_bytes())
    )
}

// ─── OSC 8: Hyperlinks ──────────────────────────────────────────────────────

/// Open a hyperlink region (OSC 8). Text written afterwards is the
/// link body; close it with [`hyperlink_end`].
pub fn hyperlink_start(w: &mut impl Write, url: &str, id: Option<&str>) -> io::Result<()> {
    match id {
        Some(id) => write!(
            w,
            "\x1b]8;id={};{}\x1b\\",
            sanitize_osc(id),
            sanitize_osc(url)
        ),
        None => write!(w, "\x1b]8;;{}\x1b\\", sanitize_osc(url)),
    }
}

/// Close the current hyperlink region.
#[inline]
pub fn hyperlink_end(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b]8;;\x1b\\")
}

/// Write `text` as a complete hyperlink to `url`.
pub fn hyperlink(w: &mut impl Write, url: &str, text: &str, id: Option<&str>) -> io::Result<()> {
    hyperlink_start(w, url, id)?;
    w.write_all(text.as_bytes())?;
    hyperlink_end(w)
}

/// Strip bytes that would terminate or corrupt an OSC string early.
fn sanitize_osc(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() && *c != '\\')
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, NamedColor};

    /// Helper: run an encoding function and return its output as a string.
    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    #[test]
    fn move_to_origin() {
        assert_eq!(emit(|w| move_to(w, 0, 0)), "\x1b[1;1H");
    }

    #[test]
    fn move_to_converts_to_one_based() {
        assert_eq!(emit(|w| move_to(w, 5, 10)), "\x1b[6;11H");
    }

    #[test]
    fn move_to_large_coordinates() {
        assert_eq!(emit(|w| move_to(w, 499, 999)), "\x1b[500;1000H");
    }

    #[test]
    fn relative_moves() {
        assert_eq!(emit(|w| move_up(w, 3)), "\x1b[3A");
        assert_eq!(emit(|w| move_down(w, 2)), "\x1b[2B");
        assert_eq!(emit(|w| move_forward(w, 5)), "\x1b[5C");
        assert_eq!(emit(|w| move_back(w, 4)), "\x1b[4D");
    }

    #[test]
    fn line_moves() {
        assert_eq!(emit(|w| move_to_next_line(w, 1)), "\x1b[1E");
        assert_eq!(emit(|w| move_to_prev_line(w, 2)), "\x1b[2F");
    }

    #[test]
    fn absolute_column_and_row() {
        assert_eq!(emit(|w| move_to_column(w, 7)), "\x1b[8G");
        assert_eq!(emit(|w| move_to_row(w, 3)), "\x1b[4d");
    }

    #[test]
    fn home() {
        assert_eq!(emit(|w| move_home(w)), "\x1b[H");
    }

    #[test]
    fn save_restore_use_dec_sequences() {
        assert_eq!(emit(|w| save_cursor(w)), "\x1b7");
        assert_eq!(emit(|w| restore_cursor(w)), "\x1b8");
    }

    #[test]
    fn cursor_visibility() {
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
    }

    // ── Screen ──────────────────────────────────────────────────────────

    #[test]
    fn clears() {
        assert_eq!(emit(|w| clear(w)), "\x1b[2J");
        assert_eq!(emit(|w| clear_below(w)), "\x1b[0J");
        assert_eq!(emit(|w| clear_above(w)), "\x1b[1J");
        assert_eq!(emit(|w| clear_line(w)), "\x1b[2K");
        assert_eq!(emit(|w| clear_line_right(w)), "\x1b[0K");
        assert_eq!(emit(|w| clear_line_left(w)), "\x1b[1K");
    }

    // ── Scrolling & editing ─────────────────────────────────────────────

    #[test]
    fn scrolls() {
        assert_eq!(emit(|w| scroll_up(w, 5)), "\x1b[5S");
        assert_eq!(emit(|w| scroll_down(w, 3)), "\x1b[3T");
    }

    #[test]
    fn scroll_region_converts_to_one_based() {
        assert_eq!(emit(|w| set_scroll_region(w, 0, 23)), "\x1b[1;24r");
        assert_eq!(emit(|w| reset_scroll_region(w)), "\x1b[r");
    }

    #[test]
    fn line_and_char_editing() {
        assert_eq!(emit(|w| insert_lines(w, 2)), "\x1b[2L");
        assert_eq!(emit(|w| delete_lines(w, 2)), "\x1b[2M");
        assert_eq!(emit(|w| insert_chars(w, 4)), "\x1b[4@");
        assert_eq!(emit(|w| delete_chars(w, 4)), "\x1b[4P");
        assert_eq!(emit(|w| erase_chars(w, 4)), "\x1b[4X");
    }

    // ── Style ───────────────────────────────────────────────────────────

    #[test]
    fn reset_style_sequence() {
        assert_eq!(emit(|w| reset_style(w)), "\x1b[0m");
    }

    #[test]
    fn style_emits_single_sequence() {
        let s = Style::new().fg(Color::Named(NamedColor::Red)).bold();
        assert_eq!(emit(|w| style(w, &s)), "\x1b[1;31m");
    }

    #[test]
    fn empty_style_emits_nothing() {
        assert_eq!(emit(|w| style(w, &Style::new())), "");
    }

    // ── Modes ───────────────────────────────────────────────────────────

    #[test]
    fn sync_sequences() {
        assert_eq!(emit(|w| begin_sync(w)), "\x1b[?2026h");
        assert_eq!(emit(|w| end_sync(w)), "\x1b[?2026l");
    }

    #[test]
    fn alt_screen_sequences() {
        assert_eq!(emit(|w| enter_alt_screen(w)), "\x1b[?1049h");
        assert_eq!(emit(|w| exit_alt_screen(w)), "\x1b[?1049l");
    }

    #[test]
    fn bracketed_paste_sequences() {
        assert_eq!(emit(|w| enable_bracketed_paste(w)), "\x1b[?2004h");
        assert_eq!(emit(|w| disable_bracketed_paste(w)), "\x1b[?2004l");
    }

    #[test]
    fn focus_event_sequences() {
        assert_eq!(emit(|w| enable_focus_events(w)), "\x1b[?1004h");
        assert_eq!(emit(|w| disable_focus_events(w)), "\x1b[?1004l");
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn mouse_normal_pairs_with_sgr_format() {
        assert_eq!(
            emit(|w| enable_mouse(w, MouseCapture::Normal)),
            "\x1b[?1000h\x1b[?1006h"
        );
        assert_eq!(
            emit(|w| disable_mouse(w, MouseCapture::Normal)),
            "\x1b[?1000l\x1b[?1006l"
        );
    }

    #[test]
    fn mouse_button_mode() {
        assert_eq!(
            emit(|w| enable_mouse(w, MouseCapture::Button)),
            "\x1b[?1002h\x1b[?1006h"
        );
        assert_eq!(
            emit(|w| disable_mouse(w, MouseCapture::Button)),
            "\x1b[?1002l\x1b[?1006l"
        );
    }

    #[test]
    fn mouse_all_mode() {
        assert_eq!(
            emit(|w| enable_mouse(w, MouseCapture::All)),
            "\x1b[?1003h\x1b[?1006h"
        );
        assert_eq!(
            emit(|w| disable_mouse(w, MouseCapture::All)),
            "\x1b[?1003l\x1b[?1006l"
        );
    }

    // ── OSC ─────────────────────────────────────────────────────────────

    #[test]
    fn title_sequence() {
        assert_eq!(emit(|w| title(w, "My App")), "\x1b]2;My App\x1b\\");
    }

    #[test]
    fn title_strips_control_bytes() {
        assert_eq!(emit(|w| title(w, "a\x1bb\nc")), "\x1b]2;abc\x1b\\");
    }

    #[test]
    fn icon_name_sequence() {
        assert_eq!(emit(|w| icon_name(w, "app")), "\x1b]1;app\x1b\\");
    }

    #[test]
    fn bell_byte() {
        assert_eq!(emit(|w| bell(w)), "\x07");
    }

    #[test]
    fn notify_without_body() {
        assert_eq!(
            emit(|w| notify(w, "Build done", None)),
            "\x1b]777;notify;Build done\x1b\\"
        );
    }

    #[test]
    fn notify_with_body() {
        assert_eq!(
            emit(|w| notify(w, "Build", Some("3 warnings"))),
            "\x1b]777;notify;Build;3 warnings\x1b\\"
        );
    }

    #[test]
    fn clipboard_encodes_base64() {
        assert_eq!(
            emit(|w| copy_to_clipboard(w, "hello", ClipboardTarget::Clipboard)),
            "\x1b]52;c;aGVsbG8=\x1b\\"
        );
    }

    #[test]
    fn clipboard_targets() {
        assert!(emit(|w| copy_to_clipboard(w, "x", ClipboardTarget::Primary)).contains("]52;p;"));
        assert!(emit(|w| copy_to_clipboard(w, "x", ClipboardTarget::Both)).contains("]52;cp;"));
    }

    #[test]
    fn hyperlink_wraps_text() {
        assert_eq!(
            emit(|w| hyperlink(w, "https://example.com", "click", None)),
            "\x1b]8;;https://example.com\x1b\\click\x1b]8;;\x1b\\"
        );
    }

    #[test]
    fn hyperlink_with_id() {
        assert_eq!(
            emit(|w| hyperlink_start(w, "https://example.com", Some("l1"))),
            "\x1b]8;id=l1;https://example.com\x1b\\"
        );
    }

    #[test]
    fn hyperlink_end_sequence() {
        assert_eq!(emit(|w| hyperlink_end(w)), "\x1b]8;;\x1b\\");
    }
}

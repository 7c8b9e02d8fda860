// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw terminal bytes into structured events: keys, mouse actions,
// paste content, and focus changes. Handles every protocol the
// `Terminal` can enable:
//
// - Legacy CSI sequences (arrows, function keys, editing keys)
// - SS3 sequences (F1-F4 alternate encoding from some terminals)
// - SGR mouse protocol (press / release / drag / move / scroll)
// - Progressive keyboard reports (`CSI codepoint ; modifiers u`)
// - Bracketed paste (accumulates pasted text between delimiters)
// - Focus reporting (terminal gained / lost focus)
// - Alt+key (ESC followed by a printable code point)
// - UTF-8 multi-byte characters
//
// # Design
//
// The parser maintains a small internal byte buffer because escape
// sequences can span multiple reads. Feed bytes with
// [`EventParser::feed`], retrieve events from the returned `Vec`.
// After [`EventParser::ESC_TIMEOUT`] with no new bytes while
// [`pending`](EventParser::pending) is true, call
// [`flush`](EventParser::flush) to emit the buffered prefix as literal
// keypresses — that is how a lone ESC becomes the Escape key.
//
// Malformed input never raises: unrecognized sequences are dropped
// silently once enough bytes prove there is no match, and parsing
// stays synchronized with the byte stream. An undecided prefix is
// never discarded — the parser waits for more bytes instead of
// guessing.
//
// Number parsing is done directly on `&[u8]` — no intermediate
// `String` allocation for CSI parameter decoding.

use std::time::Duration;

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event (button action or movement with position).
    Mouse(MouseEvent),
    /// Bracketed paste content.
    ///
    /// The terminal wraps clipboard paste with `CSI 200~` / `CSI 201~`
    /// delimiters. We accumulate the raw bytes between them — newlines,
    /// tabs, control bytes, even embedded escape sequences — and
    /// deliver the result as a single event.
    Paste(String),
    /// Terminal window focus changed: `true` for gained (`CSI I`),
    /// `false` for lost (`CSI O`).
    Focus(bool),
    /// The terminal was resized (reported out-of-band, not parsed from
    /// the byte stream).
    Resize {
        /// New height in rows.
        rows: u16,
        /// New width in columns.
        cols: u16,
    },
}

/// A keyboard event with key identity and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys.
    pub modifiers: Modifiers,
}

/// Identity of a key.
///
/// Named keys have dedicated variants; printable characters use
/// [`Char`](KeyCode::Char). Function keys F1–F12 use [`F`](KeyCode::F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Insert,
    Delete,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    /// F1 through F12.
    F(u8),
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Matches the xterm CSI modifier encoding, where the wire
    /// parameter is `1 + bitmask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

/// A mouse event with action, button, position, and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// What happened.
    pub kind: MouseKind,
    /// Which button was involved; [`MouseButton::None`] for motion
    /// without a held button and for scroll events.
    pub button: MouseButton,
    /// 0-indexed row.
    pub row: u16,
    /// 0-indexed column.
    pub col: u16,
    /// Active modifier keys during the mouse event.
    pub modifiers: Modifiers,
}

/// Mouse event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    /// Button pressed.
    Press,
    /// Button released.
    Release,
    /// Mouse moved while a button is held.
    Drag,
    /// Mouse moved without any button held.
    Move,
    /// Scroll wheel up.
    ScrollUp,
    /// Scroll wheel down.
    ScrollDown,
}

/// Mouse button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// No button: motion reports and scroll events.
    None,
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Bracketed paste opening delimiter: `ESC [ 200 ~`
const PASTE_START: &[u8] = b"\x1b[200~";
/// Bracketed paste closing delimiter: `ESC [ 201 ~`
const PASTE_END: &[u8] = b"\x1b[201~";

/// Terminal input parser.
///
/// Feed raw bytes via [`feed`](EventParser::feed) and collect
/// structured [`Event`]s. The parser buffers incomplete sequences
/// internally and resumes parsing when more bytes arrive, so a
/// sequence may span any number of `feed` calls without event loss
/// or duplication.
///
/// # Escape vs escape-sequence ambiguity
///
/// A bare `ESC` byte (0x1B) could be either a standalone Escape
/// keypress or the start of a multi-byte escape sequence. The parser
/// holds it and reports [`pending`](EventParser::pending). The caller
/// should wait [`ESC_TIMEOUT`](EventParser::ESC_TIMEOUT) and then call
/// [`flush`](EventParser::flush) to emit the held bytes as literal
/// key events.
#[derive(Debug)]
pub struct EventParser {
    /// Accumulated raw bytes waiting to be parsed.
    buf: Vec<u8>,
    /// When `true`, we're inside a bracketed paste and accumulating
    /// raw bytes until the closing delimiter arrives.
    in_paste: bool,
}

impl EventParser {
    /// How long a caller should wait before resolving a pending
    /// prefix with [`flush`](EventParser::flush).
    ///
    /// 50ms is long enough for any terminal to deliver the rest of a
    /// sequence, short enough that a real Escape keypress still feels
    /// instant.
    pub const ESC_TIMEOUT: Duration = Duration::from_millis(50);

    /// Create a new parser with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
        }
    }

    /// Feed raw input bytes and return all events that can be parsed.
    ///
    /// Bytes that form an incomplete sequence are kept in the internal
    /// buffer and will be combined with future `feed` calls. Events
    /// are returned in the exact order their bytes were consumed.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            // ── Paste mode: scan for the closing delimiter ──────────
            if self.in_paste {
                let remaining = &self.buf[pos..];
                if let Some(end_offset) = find_subsequence(remaining, PASTE_END) {
                    // Everything before the delimiter is paste content.
                    let text = String::from_utf8_lossy(&remaining[..end_offset]).into_owned();
                    events.push(Event::Paste(text));
                    pos += end_offset + PASTE_END.len();
                    self.in_paste = false;
                } else {
                    // Delimiter not yet seen — keep all bytes buffered.
                    break;
                }
                continue;
            }

            // ── Paste start: check before general parsing ───────────
            // Detected here so the CSI parser never sees `CSI 200~`.
            let remaining = &self.buf[pos..];
            if remaining.len() >= PASTE_START.len() && remaining[..PASTE_START.len()] == *PASTE_START
            {
                self.in_paste = true;
                pos += PASTE_START.len();
                continue;
            }
            // A shorter buffer that matches a prefix of the paste
            // delimiter is undecided: it could grow into `CSI 200~` or
            // into a different CSI sequence (`CSI 2~` is Insert). Wait
            // for more bytes rather than guess.
            if remaining.len() < PASTE_START.len()
                && PASTE_START.starts_with(remaining)
                && remaining.starts_with(b"\x1b[")
            {
                break;
            }

            // ── Normal parsing ──────────────────────────────────────
            match try_parse(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n.max(1),
            }
        }

        // Compact: remove consumed bytes, keep the unconsumed remainder.
        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Whether buffered bytes are waiting on a timeout decision.
    ///
    /// True for a lone ESC, a partial escape sequence, or a partial
    /// UTF-8 character. False inside a bracketed paste: paste content
    /// is not ambiguous and may take arbitrarily long to arrive.
    #[must_use]
    pub fn pending(&self) -> bool {
        !self.in_paste && !self.buf.is_empty()
    }

    /// Flush buffered bytes as literal key events.
    ///
    /// Called after [`ESC_TIMEOUT`](EventParser::ESC_TIMEOUT) to
    /// resolve the ESC ambiguity: a lone ESC becomes an Escape key
    /// event, and any other held bytes become the keys they encode.
    /// A no-op while inside a bracketed paste.
    pub fn flush(&mut self) -> Vec<Event> {
        if self.in_paste {
            return Vec::new();
        }

        let mut events = Vec::new();
        for &byte in &self.buf {
            let (code, modifiers) = match byte {
                0x1B => (KeyCode::Escape, Modifiers::empty()),
                0x00 => (KeyCode::Char(' '), Modifiers::CTRL),
                b @ 0x01..=0x1A => (KeyCode::Char((b + 0x60) as char), Modifiers::CTRL),
                0x7F => (KeyCode::Backspace, Modifiers::empty()),
                b @ 0x20..=0x7E => (KeyCode::Char(b as char), Modifiers::empty()),
                _ => continue,
            };
            events.push(Event::Key(KeyEvent { code, modifiers }));
        }
        self.buf.clear();
        events
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────
//
// All parse functions are pure — they read from the front of a slice
// and return what they found plus how many bytes to consume.

/// Result of trying to parse one event from the buffer.
enum Parsed {
    /// Successfully parsed an event, consuming `usize` bytes.
    Event(Event, usize),
    /// Sequence is incomplete — need more bytes.
    Incomplete,
    /// Unrecognized byte(s), skip `usize` bytes.
    Skip(usize),
}

/// Try to parse a single event from the front of `buf`.
fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        // ESC — could be an escape sequence or a standalone Escape key.
        0x1B => parse_escape(buf),
        // Dedicated control keys.
        0x0D => Parsed::Event(press(KeyCode::Enter), 1),
        0x09 => Parsed::Event(press(KeyCode::Tab), 1),
        0x7F => Parsed::Event(press(KeyCode::Backspace), 1),
        // Remaining C0 bytes decode as Ctrl+letter.
        0x00 => Parsed::Event(ctrl_key(KeyCode::Char(' ')), 1),
        b @ 0x01..=0x1A => Parsed::Event(ctrl_key(KeyCode::Char((b + 0x60) as char)), 1),
        // ASCII printable.
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(b as char)), 1),
        // UTF-8 multi-byte.
        0xC0..=0xFF => parse_utf8(buf),
        // 0x1C-0x1F and bare continuation bytes (0x80-0xBF) — skip.
        _ => Parsed::Skip(1),
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    debug_assert_eq!(buf[0], 0x1B);

    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        // CSI: ESC [
        b'[' => parse_csi(buf),
        // SS3: ESC O
        b'O' => parse_ss3(buf),
        // Alt+ESC.
        0x1B => Parsed::Event(key_with(KeyCode::Escape, Modifiers::ALT), 2),
        // Alt+control character (e.g. ESC Ctrl+A).
        b @ 0x01..=0x1A => Parsed::Event(
            key_with(
                KeyCode::Char((b + 0x60) as char),
                Modifiers::ALT | Modifiers::CTRL,
            ),
            2,
        ),
        // Alt+printable ASCII character.
        b @ 0x20..=0x7E => Parsed::Event(key_with(KeyCode::Char(b as char), Modifiers::ALT), 2),
        // Alt+non-ASCII code point.
        0xC0..=0xFF => match parse_utf8(&buf[1..]) {
            Parsed::Event(Event::Key(key), consumed) => Parsed::Event(
                key_with(key.code, key.modifiers | Modifiers::ALT),
                consumed + 1,
            ),
            Parsed::Event(_, consumed) => Parsed::Skip(consumed + 1),
            Parsed::Incomplete => Parsed::Incomplete,
            Parsed::Skip(n) => Parsed::Skip(n + 1),
        },
        // Anything else after ESC is an escape sequence we don't
        // recognize — drop both bytes.
        _ => Parsed::Skip(2),
    }
}

// ── CSI (Control Sequence Introducer) ───────────────────────────────────────

fn parse_csi(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'[');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    // SGR mouse: ESC [ <
    if buf[2] == b'<' {
        return parse_sgr_mouse(buf);
    }

    // Focus reporting: ESC [ I (gained) / ESC [ O (lost).
    if buf[2] == b'I' {
        return Parsed::Event(Event::Focus(true), 3);
    }
    if buf[2] == b'O' {
        return Parsed::Event(Event::Focus(false), 3);
    }

    // Scan for the final byte (0x40..=0x7E).
    // CSI parameter bytes are in 0x30..=0x3F, intermediate in 0x20..=0x2F.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            // Invalid byte inside a CSI sequence — abandon it.
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params_raw = &buf[2..end];
    let consumed = end + 1;

    // ── Tilde-terminated sequences (editing keys, function keys) ─────
    if final_byte == b'~' {
        let params = parse_csi_params(params_raw);
        let first = params.first().map_or(0, |p| p.0);
        let modifiers = params
            .get(1)
            .map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

        let code = match first {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            11 => KeyCode::F(1),
            12 => KeyCode::F(2),
            13 => KeyCode::F(3),
            14 => KeyCode::F(4),
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => return Parsed::Skip(consumed),
        };
        return Parsed::Event(key_with(code, modifiers), consumed);
    }

    // ── Progressive keyboard report: CSI codepoint [; modifiers] u ───
    if final_byte == b'u' {
        return parse_codepoint_key(params_raw, consumed);
    }

    // ── Letter finals (arrows, Home/End, Shift+Tab) ─────────────────
    let params = parse_csi_params(params_raw);
    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

    let event = match final_byte {
        b'A' => key_with(KeyCode::Up, modifiers),
        b'B' => key_with(KeyCode::Down, modifiers),
        b'C' => key_with(KeyCode::Right, modifiers),
        b'D' => key_with(KeyCode::Left, modifiers),
        b'H' => key_with(KeyCode::Home, modifiers),
        b'F' => key_with(KeyCode::End, modifiers),
        b'Z' => key_with(KeyCode::Tab, Modifiers::SHIFT),
        _ => return Parsed::Skip(consumed),
    };

    Parsed::Event(event, consumed)
}

// ── SS3 (Single Shift 3) ───────────────────────────────────────────────────

fn parse_ss3(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'O');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match buf[2] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Parsed::Skip(3),
    };

    Parsed::Event(press(code), 3)
}

// ── SGR Mouse Protocol ─────────────────────────────────────────────────────

/// Button-code bit layout for SGR mouse reports.
const MOUSE_BUTTON_MASK: u16 = 0b0000_0011;
const MOUSE_SHIFT: u16 = 0b0000_0100;
const MOUSE_ALT: u16 = 0b0000_1000;
const MOUSE_CTRL: u16 = 0b0001_0000;
const MOUSE_MOTION: u16 = 0b0010_0000;
const MOUSE_SCROLL: u16 = 0b0100_0000;
const MOUSE_SCROLL_DOWN: u16 = 0b0000_0001;

fn parse_sgr_mouse(buf: &[u8]) -> Parsed {
    // Format: ESC [ < Pb ; Px ; Py M    (press / drag)
    //         ESC [ < Pb ; Px ; Py m    (release / move)
    debug_assert!(buf.len() >= 3 && buf[2] == b'<');

    let start = 3;
    let mut end = start;
    while end < buf.len() {
        if buf[end] == b'M' || buf[end] == b'm' {
            break;
        }
        // Valid bytes in SGR mouse params: digits and semicolons.
        if !buf[end].is_ascii_digit() && buf[end] != b';' {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let is_press = buf[end] == b'M';
    let consumed = end + 1;

    // Three semicolon-separated numbers: button_flags ; col ; row.
    let params = &buf[start..end];
    let (cb, rest) = parse_u16_from(params);
    let rest = skip_byte(rest, b';');
    let (raw_col, rest) = parse_u16_from(rest);
    let rest = skip_byte(rest, b';');
    let (raw_row, _) = parse_u16_from(rest);

    // SGR coordinates are 1-indexed; we use 0-indexed.
    let col = raw_col.saturating_sub(1);
    let row = raw_row.saturating_sub(1);

    let mut modifiers = Modifiers::empty();
    if cb & MOUSE_SHIFT != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & MOUSE_ALT != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & MOUSE_CTRL != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let (kind, button) = if cb & MOUSE_SCROLL != 0 {
        let kind = if cb & MOUSE_SCROLL_DOWN != 0 {
            MouseKind::ScrollDown
        } else {
            MouseKind::ScrollUp
        };
        (kind, MouseButton::None)
    } else {
        let button = match cb & MOUSE_BUTTON_MASK {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        };
        let kind = match (cb & MOUSE_MOTION != 0, is_press) {
            (true, true) => MouseKind::Drag,
            (true, false) => MouseKind::Move,
            (false, true) => MouseKind::Press,
            (false, false) => MouseKind::Release,
        };
        (kind, button)
    };

    Parsed::Event(
        Event::Mouse(MouseEvent {
            kind,
            button,
            row,
            col,
            modifiers,
        }),
        consumed,
    )
}

// ── Progressive Keyboard Reports ───────────────────────────────────────────

fn parse_codepoint_key(params_raw: &[u8], consumed: usize) -> Parsed {
    // Format: CSI codepoint [; modifiers] u. A few ASCII control
    // codepoints map to named keys; the rest are plain characters.
    if params_raw.is_empty() {
        return Parsed::Skip(consumed);
    }

    let params = parse_csi_params(params_raw);
    let codepoint = params.first().map_or(0, |p| p.0);
    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

    let code = match codepoint {
        9 => KeyCode::Tab,
        13 => KeyCode::Enter,
        27 => KeyCode::Escape,
        127 => KeyCode::Backspace,
        cp => match char::from_u32(u32::from(cp)) {
            Some(c) => KeyCode::Char(c),
            None => return Parsed::Skip(consumed),
        },
    };

    Parsed::Event(key_with(code, modifiers), consumed)
}

// ── UTF-8 ──────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);

    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    // Validate continuation bytes (must start with 0b10xxxxxx).
    for &b in &buf[1..expected] {
        if b & 0xC0 != 0x80 {
            return Parsed::Skip(1);
        }
    }

    std::str::from_utf8(&buf[..expected]).map_or(Parsed::Skip(1), |s| {
        s.chars().next().map_or(Parsed::Skip(expected), |ch| {
            Parsed::Event(press(KeyCode::Char(ch)), expected)
        })
    })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Create a simple key press event with no modifiers.
const fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent {
        code,
        modifiers: Modifiers::empty(),
    })
}

/// Create a Ctrl+key press event.
const fn ctrl_key(code: KeyCode) -> Event {
    Event::Key(KeyEvent {
        code,
        modifiers: Modifiers::CTRL,
    })
}

/// Create a key press event with specific modifiers.
const fn key_with(code: KeyCode, modifiers: Modifiers) -> Event {
    Event::Key(KeyEvent { code, modifiers })
}

/// CSI parameter: `(main_value, colon_sub_parameter)`.
///
/// Colon sub-parameters appear in progressive keyboard reports
/// (`modifier:event_type`); we parse them to stay synchronized but only
/// use the main value.
struct CsiParam(u16, #[allow(dead_code)] u16);

/// Parse semicolon-separated CSI parameters with optional colon sub-params.
///
/// Examples:
/// - `1;2` → `[(1,0), (2,0)]`
/// - `97;5:2` → `[(97,0), (5,2)]`
/// - (empty) → `[]`
fn parse_csi_params(raw: &[u8]) -> Vec<CsiParam> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut params = Vec::with_capacity(4);
    let mut pos = 0;

    while pos <= raw.len() {
        let (main_val, next) = parse_u16_at(raw, pos);
        pos = next;

        let sub_val = if pos < raw.len() && raw[pos] == b':' {
            pos += 1;
            let (v, n) = parse_u16_at(raw, pos);
            pos = n;
            v
        } else {
            0
        };

        params.push(CsiParam(main_val, sub_val));

        if pos < raw.len() && raw[pos] == b';' {
            pos += 1;
        } else {
            break;
        }
    }

    params
}

/// Parse a u16 from bytes starting at `start`, stopping at a non-digit.
/// Returns `(value, next_position)`.
fn parse_u16_at(buf: &[u8], start: usize) -> (u16, usize) {
    let mut val: u16 = 0;
    let mut pos = start;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .saturating_mul(10)
            .saturating_add(u16::from(buf[pos] - b'0'));
        pos += 1;
    }
    (val, pos)
}

/// Parse a u16 from the start of a byte slice.
/// Returns `(value, remaining_bytes)`.
fn parse_u16_from(buf: &[u8]) -> (u16, &[u8]) {
    let (val, pos) = parse_u16_at(buf, 0);
    (val, &buf[pos..])
}

/// Skip a leading byte if it matches `expected`.
fn skip_byte(buf: &[u8], expected: u8) -> &[u8] {
    if buf.first() == Some(&expected) {
        &buf[1..]
    } else {
        buf
    }
}

/// Decode a CSI modifier parameter into `Modifiers` bitflags.
///
/// The encoding is `1 + bitmask`. A parameter of 0 or 1 means no
/// modifiers. Bits above the three we track are discarded.
const fn decode_modifiers(param: u16) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    #[allow(clippy::cast_possible_truncation)] // Only the low 3 bits survive.
    Modifiers::from_bits_truncate(val as u8)
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for invalid lead bytes (continuation bytes, 0xF8-0xFF).
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

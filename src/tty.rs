// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stream interfaces and real tty implementations.
//
// The `Terminal` talks to its streams exclusively through the
// `InputSource` / `OutputSink` traits, so anything byte-shaped can sit
// on either end — the process tty, a pty, a pipe in tests.
//
// Safety: the tty implementations necessarily use `unsafe` for termios
// (tcgetattr, tcsetattr), poll, ioctl (TIOCGWINSZ), isatty, and raw fd
// reads. These are the standard POSIX interfaces for terminal control —
// there is no safe alternative. Each unsafe block is minimal.
//
// Raw-mode switching lives here rather than in the sequence encoder
// because it is a device-mode syscall, not protocol bytes: it takes
// effect immediately and is never buffered.

use std::io::{self, Write};
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── Stream Traits ──────────────────────────────────────────────────────────

/// Byte source the terminal reads input events from.
///
/// All methods take `&self`: implementations are expected to be usable
/// from the terminal's locking scheme without a long-held `&mut`
/// borrow. A readiness wait must not block concurrent output.
pub trait InputSource {
    /// Wait until the source has bytes available, up to `timeout`.
    /// `None` waits indefinitely. Returns `false` on timeout.
    fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool>;

    /// Read whatever is available right now into `buf`, without
    /// blocking. Returns the number of bytes read; 0 means nothing is
    /// available (or end of stream).
    fn read_available(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Switch the device between raw and cooked mode. A no-op for
    /// sources that are not terminal devices.
    fn set_raw_mode(&self, enabled: bool) -> io::Result<()>;

    /// Whether the source is a terminal device.
    fn is_tty(&self) -> bool;
}

/// Byte sink the terminal writes encoded output to.
pub trait OutputSink {
    /// Write all of `bytes` to the sink.
    fn write_all(&self, bytes: &[u8]) -> io::Result<()>;

    /// Flush the sink.
    fn flush(&self) -> io::Result<()>;

    /// Whether the sink is a terminal device.
    fn is_tty(&self) -> bool;

    /// Current device size, if the sink can report one.
    fn size(&self) -> Option<Size>;
}

// ─── TtyInput ───────────────────────────────────────────────────────────────

/// The process's stdin as an [`InputSource`].
///
/// Raw mode is implemented with termios: the original settings are
/// saved on the first switch and restored on the way back, so the
/// user's shell comes back exactly as it was.
pub struct TtyInput {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    saved: Mutex<Option<libc::termios>>,
}

impl TtyInput {
    /// Create a handle for stdin. Does not change any terminal state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            saved: Mutex::new(None),
        }
    }
}

impl Default for TtyInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl InputSource for TtyInput {
    fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let ms: libc::c_int = match timeout {
            None => -1,
            Some(d) => {
                let ms = libc::c_int::try_from(d.as_millis()).unwrap_or(libc::c_int::MAX);
                // Round sub-millisecond waits up so they actually wait.
                if ms == 0 && !d.is_zero() { 1 } else { ms }
            }
        };

        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, ms)
        };

        Ok(ready > 0)
    }

    fn read_available(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }

    fn set_raw_mode(&self, enabled: bool) -> io::Result<()> {
        if !self.is_tty() {
            return Ok(());
        }

        let mut saved = self.saved.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if enabled {
            unsafe {
                let mut termios: libc::termios = std::mem::zeroed();
                if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                    return Err(io::Error::last_os_error());
                }

                if saved.is_none() {
                    *saved = Some(termios);
                }

                // cfmakeraw equivalent: disable all line processing.
                termios.c_iflag &= !(libc::IGNBRK
                    | libc::BRKINT
                    | libc::PARMRK
                    | libc::ISTRIP
                    | libc::INLCR
                    | libc::IGNCR
                    | libc::ICRNL
                    | libc::IXON);
                termios.c_oflag &= !libc::OPOST;
                termios.c_lflag &=
                    !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
                termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
                termios.c_cflag |= libc::CS8;

                // VMIN=1, VTIME=0: read() blocks until at least 1 byte.
                termios.c_cc[libc::VMIN] = 1;
                termios.c_cc[libc::VTIME] = 0;

                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        } else if let Some(original) = saved.take() {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        }

        Ok(())
    }

    fn is_tty(&self) -> bool {
        unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
    }
}

#[cfg(not(unix))]
impl InputSource for TtyInput {
    fn wait_readable(&self, _timeout: Option<Duration>) -> io::Result<bool> {
        Ok(false)
    }

    fn read_available(&self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn set_raw_mode(&self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }

    fn is_tty(&self) -> bool {
        false
    }
}

// ─── TtyOutput ──────────────────────────────────────────────────────────────

/// The process's stdout as an [`OutputSink`].
pub struct TtyOutput;

impl OutputSink for TtyOutput {
    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }

    #[cfg(unix)]
    fn is_tty(&self) -> bool {
        unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
    }

    #[cfg(not(unix))]
    fn is_tty(&self) -> bool {
        false
    }

    /// Query the terminal size via `ioctl(TIOCGWINSZ)`.
    #[cfg(unix)]
    fn size(&self) -> Option<Size> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

        if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
            Some(Size {
                rows: ws.ws_row,
                cols: ws.ws_col,
            })
        } else {
            None
        }
    }

    #[cfg(not(unix))]
    fn size(&self) -> Option<Size> {
        None
    }
}

// ─── SIGWINCH ───────────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler, consumed by `read_event`.
static WINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only sets [`WINCH_RECEIVED`] — writing an atomic is one
/// of the few operations permitted inside signal handlers. Installed at
/// most once per process.
#[cfg(unix)]
pub(crate) fn install_winch_handler() {
    use std::sync::Once;
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = winch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    });
}

#[cfg(unix)]
extern "C" fn winch_handler(_sig: libc::c_int) {
    WINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
pub(crate) fn install_winch_handler() {}

/// Consume the resize flag. Returns `true` at most once per signal.
pub(crate) fn take_winch() -> bool {
    WINCH_RECEIVED.swap(false, Ordering::Relaxed)
}

// ─── Test Doubles ───────────────────────────────────────────────────────────


// ─── Tests ──────────────────────────────────────────────────────────────────

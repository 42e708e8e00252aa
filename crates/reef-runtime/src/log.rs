//! Logging facade over the host `log` import.
//!
//! All calls are fire-and-forget: there is no error channel back from the host.

use core::fmt;

use reef_contracts::LOG_INT_BUF_LEN;

use crate::host::HostEnvironment;
use crate::prim;

/// Logs a NUL-terminated message. `None` logs an empty message.
pub fn log_text<H: HostEnvironment + ?Sized>(host: &mut H, message: Option<&[u8]>) {
    let len = prim::length_of(message);
    let bytes = message.unwrap_or(&[]);
    host.log(&bytes[..len]);
}

pub fn log_bytes<H: HostEnvironment + ?Sized>(host: &mut H, message: &[u8]) {
    host.log(message);
}

pub fn log_str<H: HostEnvironment + ?Sized>(host: &mut H, message: &str) {
    host.log(message.as_bytes());
}

/// Logs `value` in base 10.
pub fn log_integer<H: HostEnvironment + ?Sized>(host: &mut H, value: i32) {
    let mut buf = [0u8; LOG_INT_BUF_LEN];
    // The buffer holds the widest i32, so this cannot fail.
    if let Ok(len) = prim::integer_to_text_into(value, 10, &mut buf) {
        host.log(&buf[..len]);
    }
}

/// Fixed-capacity line buffer for formatted log messages. Output past the capacity
/// is dropped at a character boundary.
pub struct LineBuf {
    buf: [u8; LineBuf::CAPACITY],
    len: usize,
    truncated: bool,
}

impl LineBuf {
    pub const CAPACITY: usize = 256;

    pub const fn new() -> Self {
        LineBuf {
            buf: [0; LineBuf::CAPACITY],
            len: 0,
            truncated: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        LineBuf::new()
    }
}

impl fmt::Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = Self::CAPACITY - self.len;
        let mut n = s.len().min(room);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        if n < s.len() {
            self.truncated = true;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

/// `format!`-style logging through anything with a `log_bytes` method (a
/// [`Job`](crate::Job) or its [`Io`](crate::Io)).
///
/// ```ignore
/// reef_log!(job, "processed {} of {} records", done, total);
/// ```
#[macro_export]
macro_rules! reef_log {
    ($target:expr, $($arg:tt)*) => {{
        let mut line = $crate::log::LineBuf::new();
        let _ = ::core::fmt::Write::write_fmt(&mut line, ::core::format_args!($($arg)*));
        $target.log_bytes(line.as_bytes());
    }};
}

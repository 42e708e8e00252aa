//! Memory, string and number primitives a freestanding module has to bring itself.
//!
//! Everything here works on bounds-checked slices. The raw-pointer entry points exist
//! only for the FFI edge (`length_of_raw`).

use core::fmt;

use reef_contracts::{INT_TEXT_BUF_LEN, MAX_RADIX, MIN_RADIX};

use crate::error::PrimitiveError;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Counts the bytes before the first NUL.
///
/// `None` counts as empty. A slice without a terminator counts in full; nothing past
/// the end of the slice is read.
pub fn length_of(text: Option<&[u8]>) -> usize {
    match text {
        None => 0,
        Some(bytes) => bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()),
    }
}

/// Length of a NUL-terminated string behind a raw pointer. Null counts as empty.
///
/// # Safety
///
/// A non-null `ptr` must point to readable memory that contains a NUL byte.
pub unsafe fn length_of_raw(ptr: *const u8) -> usize {
    if ptr.is_null() {
        return 0;
    }
    let mut len = 0;
    // SAFETY: the caller guarantees a terminator is reachable from `ptr`.
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    len
}

/// Copies exactly `n` bytes from `src` into the front of `dst`, byte by byte.
pub fn copy<'a>(dst: &'a mut [u8], src: &[u8], n: usize) -> Result<&'a mut [u8], PrimitiveError> {
    let available = dst.len().min(src.len());
    if n > available {
        return Err(PrimitiveError::OutOfBounds {
            requested: n,
            available,
        });
    }
    for (d, s) in dst[..n].iter_mut().zip(&src[..n]) {
        *d = *s;
    }
    Ok(dst)
}

/// Writes the low 8 bits of `value` into the first `n` bytes of `dst`.
pub fn fill(dst: &mut [u8], value: i32, n: usize) -> Result<&mut [u8], PrimitiveError> {
    if n > dst.len() {
        return Err(PrimitiveError::OutOfBounds {
            requested: n,
            available: dst.len(),
        });
    }
    let byte = value as u8;
    for d in &mut dst[..n] {
        *d = byte;
    }
    Ok(dst)
}

/// Renders `value` in `base` into `out`, NUL-terminated. Returns the text length
/// (terminator excluded).
pub fn integer_to_text_into(value: i32, base: u32, out: &mut [u8]) -> Result<usize, PrimitiveError> {
    if !(MIN_RADIX..=MAX_RADIX).contains(&base) {
        if let Some(first) = out.first_mut() {
            *first = 0;
        }
        return Err(PrimitiveError::InvalidBase { base });
    }

    // Digits accumulate least significant first and are reversed below.
    let mut magnitude = value.unsigned_abs();
    let mut len = 0;
    loop {
        let slot = out.get_mut(len).ok_or(PrimitiveError::OutOfBounds {
            requested: len + 1,
            available: len,
        })?;
        *slot = DIGITS[(magnitude % base) as usize];
        len += 1;
        magnitude /= base;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        let slot = out.get_mut(len).ok_or(PrimitiveError::OutOfBounds {
            requested: len + 1,
            available: len,
        })?;
        *slot = b'-';
        len += 1;
    }
    let available = out.len();
    let terminator = out.get_mut(len).ok_or(PrimitiveError::OutOfBounds {
        requested: len + 1,
        available,
    })?;
    *terminator = 0;

    out[..len].reverse();
    Ok(len)
}

/// An integer rendered as NUL-terminated text.
#[derive(Clone, Copy)]
pub struct IntText {
    buf: [u8; INT_TEXT_BUF_LEN],
    len: usize,
}

impl IntText {
    pub const fn empty() -> Self {
        IntText {
            buf: [0; INT_TEXT_BUF_LEN],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits, letters and '-' are ever written.
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl fmt::Debug for IntText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for IntText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<&str> for IntText {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Strict rendering: an out-of-range base is an error.
pub fn try_integer_to_text(value: i32, base: u32) -> Result<IntText, PrimitiveError> {
    let mut text = IntText::empty();
    text.len = integer_to_text_into(value, base, &mut text.buf)?;
    Ok(text)
}

/// Legacy rendering: an out-of-range base yields the empty string.
pub fn integer_to_text(value: i32, base: u32) -> IntText {
    try_integer_to_text(value, base).unwrap_or(IntText::empty())
}

/// Reverses the byte order of every 32-bit word in `buf`, in place.
///
/// Returns the number of words swapped. A length that is not a multiple of 4 is
/// rejected up front and leaves `buf` untouched.
pub fn swap_endian_32(buf: &mut [u8]) -> Result<usize, PrimitiveError> {
    check_word_len(buf.len())?;
    for word in buf.chunks_exact_mut(4) {
        word.reverse();
    }
    Ok(buf.len() / 4)
}

/// Reads `bytes` as 32-bit words of the opposite byte order to the module's own
/// (little-endian) layout.
pub fn swapped_words(bytes: &[u8]) -> Result<SwappedWords<'_>, PrimitiveError> {
    check_word_len(bytes.len())?;
    Ok(SwappedWords {
        chunks: bytes.chunks_exact(4),
    })
}

fn check_word_len(len: usize) -> Result<(), PrimitiveError> {
    if len % 4 != 0 {
        return Err(PrimitiveError::InvalidLength {
            len,
            multiple_of: 4,
        });
    }
    Ok(())
}

pub struct SwappedWords<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl Iterator for SwappedWords<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let c = self.chunks.next()?;
        Some(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for SwappedWords<'_> {}

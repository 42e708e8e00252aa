//! The Result Envelope and the three emit entry points.
//!
//! Each emission is exactly one `result(discriminant, ptr, len)` host call. Nothing
//! here tracks whether a result was already sent: hosts keep the last one, and a run
//! without any emission is the host's problem to report.

use core::fmt;

use reef_contracts::{RESULT_KIND_BYTES, RESULT_KIND_INTEGER, RESULT_KIND_STRING};

use crate::host::HostEnvironment;

/// Wire discriminant of a result. The numeric values are frozen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultKind {
    Integer = RESULT_KIND_INTEGER,
    Bytes = RESULT_KIND_BYTES,
    String = RESULT_KIND_STRING,
}

impl ResultKind {
    pub const fn discriminant(self) -> u32 {
        self as u32
    }

    pub const fn from_discriminant(raw: u32) -> Option<Self> {
        match raw {
            RESULT_KIND_INTEGER => Some(ResultKind::Integer),
            RESULT_KIND_BYTES => Some(ResultKind::Bytes),
            RESULT_KIND_STRING => Some(ResultKind::String),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Integer => "integer",
            ResultKind::Bytes => "bytes",
            ResultKind::String => "string",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultEnvelope<'a> {
    Integer(i32),
    Bytes(&'a [u8]),
    /// Text bytes, terminator excluded. Encoding is not checked.
    String(&'a [u8]),
}

impl ResultEnvelope<'_> {
    pub fn kind(&self) -> ResultKind {
        match self {
            ResultEnvelope::Integer(_) => ResultKind::Integer,
            ResultEnvelope::Bytes(_) => ResultKind::Bytes,
            ResultEnvelope::String(_) => ResultKind::String,
        }
    }

    pub fn emit<H: HostEnvironment + ?Sized>(&self, host: &mut H) {
        match *self {
            ResultEnvelope::Integer(v) => emit_integer(host, v),
            ResultEnvelope::Bytes(b) => emit_bytes(host, b),
            ResultEnvelope::String(s) => emit_string(host, s),
        }
    }
}

/// Emits `value` as its 4-byte little-endian representation, discriminant 0.
pub fn emit_integer<H: HostEnvironment + ?Sized>(host: &mut H, value: i32) {
    host.emit_result(ResultKind::Integer, &value.to_le_bytes());
}

pub fn emit_bytes<H: HostEnvironment + ?Sized>(host: &mut H, bytes: &[u8]) {
    host.emit_result(ResultKind::Bytes, bytes);
}

pub fn emit_string<H: HostEnvironment + ?Sized>(host: &mut H, text: &[u8]) {
    host.emit_result(ResultKind::String, text);
}

pub fn emit_str<H: HostEnvironment + ?Sized>(host: &mut H, text: &str) {
    emit_string(host, text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, TestHost};

    #[test]
    fn discriminants_match_contract() {
        assert_eq!(ResultKind::Integer.discriminant(), 0);
        assert_eq!(ResultKind::Bytes.discriminant(), 1);
        assert_eq!(ResultKind::String.discriminant(), 2);
        for raw in 0..3 {
            let kind = ResultKind::from_discriminant(raw).unwrap();
            assert_eq!(kind.discriminant(), raw);
        }
        assert_eq!(ResultKind::from_discriminant(3), None);
    }

    #[test]
    fn emit_integer_sends_four_le_bytes() {
        let mut host = TestHost::default();
        emit_integer(&mut host, 42);
        assert_eq!(
            host.calls,
            vec![Call::Emit(ResultKind::Integer, vec![42, 0, 0, 0])]
        );

        let mut host = TestHost::default();
        emit_integer(&mut host, -2);
        assert_eq!(
            host.calls,
            vec![Call::Emit(ResultKind::Integer, (-2i32).to_le_bytes().to_vec())]
        );
    }

    #[test]
    fn envelope_emits_payload_verbatim() {
        let mut host = TestHost::default();
        ResultEnvelope::Bytes(&[1, 2, 3]).emit(&mut host);
        ResultEnvelope::String(b"done").emit(&mut host);
        assert_eq!(
            host.calls,
            vec![
                Call::Emit(ResultKind::Bytes, vec![1, 2, 3]),
                Call::Emit(ResultKind::String, b"done".to_vec()),
            ]
        );
        assert_eq!(ResultEnvelope::Integer(1).kind(), ResultKind::Integer);
    }
}

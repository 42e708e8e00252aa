use anyhow::{bail, Result};
use reef_contracts::{
    RESULT_INTEGER_WIDTH, RESULT_KIND_BYTES, RESULT_KIND_INTEGER, RESULT_KIND_STRING,
};
use serde::{Deserialize, Serialize};

/// A result payload decoded the way a host stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultValue {
    Integer {
        value: i32,
    },
    Bytes {
        #[serde(rename = "bytes_b64", with = "crate::b64")]
        bytes: Vec<u8>,
    },
    /// Invalid UTF-8 is replaced, not rejected.
    String {
        text: String,
    },
}

impl ResultValue {
    pub fn kind(&self) -> u32 {
        match self {
            ResultValue::Integer { .. } => RESULT_KIND_INTEGER,
            ResultValue::Bytes { .. } => RESULT_KIND_BYTES,
            ResultValue::String { .. } => RESULT_KIND_STRING,
        }
    }
}

pub fn decode_result(kind: u32, payload: &[u8]) -> Result<ResultValue> {
    match kind {
        RESULT_KIND_INTEGER => {
            let Ok(raw) = <[u8; RESULT_INTEGER_WIDTH]>::try_from(payload) else {
                bail!(
                    "integer result must be exactly {RESULT_INTEGER_WIDTH} bytes, got {}",
                    payload.len()
                );
            };
            Ok(ResultValue::Integer {
                value: i32::from_le_bytes(raw),
            })
        }
        RESULT_KIND_BYTES => Ok(ResultValue::Bytes {
            bytes: payload.to_vec(),
        }),
        RESULT_KIND_STRING => Ok(ResultValue::String {
            text: String::from_utf8_lossy(payload).into_owned(),
        }),
        other => bail!("unknown result discriminant {other}"),
    }
}

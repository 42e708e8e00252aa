use reef_contracts::{REEF_ABI_VERSION, REEF_RUN_REPORT_SCHEMA_VERSION};
use reef_policy::AbiPolicy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::decode::ResultValue;
use crate::host::HostCall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub schema_version: String,
    pub abi_version: u32,
    pub policy: PolicyReport,
    pub ok: bool,
    pub failure: Option<String>,
    pub trap: Option<String>,
    pub dataset: DatasetReport,
    pub emit_count: usize,
    /// The last emitted result; earlier ones were overwritten.
    pub result: Option<ResultValue>,
    pub logs: Vec<String>,
    pub progress: Vec<f32>,
    pub sleeps: Vec<f32>,
    pub memory: MemoryReport,
    pub calls: Vec<HostCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub granularity: String,
    pub implicit_result: String,
    pub placeholder_emitted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub len: usize,
    pub allocated_len: Option<usize>,
    pub sha256: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryReport {
    pub heap_base: usize,
    pub high_water_mark: Option<usize>,
    pub pages: usize,
    pub grow_calls: usize,
}

impl JobReport {
    pub(crate) fn new(policy: AbiPolicy, dataset: &[u8]) -> Self {
        JobReport {
            schema_version: REEF_RUN_REPORT_SCHEMA_VERSION.to_string(),
            abi_version: REEF_ABI_VERSION,
            policy: PolicyReport {
                granularity: policy.granularity.as_str().to_string(),
                implicit_result: policy.implicit_result.as_str().to_string(),
                placeholder_emitted: false,
            },
            ok: false,
            failure: None,
            trap: None,
            dataset: DatasetReport {
                len: dataset.len(),
                allocated_len: None,
                sha256: sha256_hex(dataset),
            },
            emit_count: 0,
            result: None,
            logs: Vec::new(),
            progress: Vec::new(),
            sleeps: Vec::new(),
            memory: MemoryReport::default(),
            calls: Vec::new(),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_lower(&hasher.finalize())
}

/// Lowercase hex rendering, two digits per byte.
pub fn hex_lower(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0F) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hex_lower_pads_each_byte() {
        assert_eq!(hex_lower(&[]), "");
        assert_eq!(hex_lower(&[0x00, 0x0a, 0xf0, 0xff]), "000af0ff");
    }
}

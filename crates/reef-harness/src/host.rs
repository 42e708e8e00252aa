use reef_runtime::{HostEnvironment, ResultKind};
use serde::{Deserialize, Serialize};

/// One import call as the host saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "import", rename_all = "snake_case")]
pub enum HostCall {
    DatasetLen {
        len: usize,
    },
    DatasetWrite {
        len: usize,
    },
    Result {
        kind: u32,
        #[serde(rename = "payload_b64", with = "crate::b64")]
        payload: Vec<u8>,
    },
    Log {
        #[serde(rename = "message_b64", with = "crate::b64")]
        message: Vec<u8>,
    },
    Progress {
        fraction: f32,
    },
    Sleep {
        seconds: f32,
    },
}

/// Host double that serves a dataset and records every call.
///
/// Results follow host semantics: each `result` call replaces the stored one, and
/// the number of calls is kept separately.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    dataset: Vec<u8>,
    calls: Vec<HostCall>,
    last_result: Option<(u32, Vec<u8>)>,
    emit_count: usize,
}

impl RecordingHost {
    pub fn new(dataset: impl Into<Vec<u8>>) -> Self {
        RecordingHost {
            dataset: dataset.into(),
            ..RecordingHost::default()
        }
    }

    pub fn dataset(&self) -> &[u8] {
        &self.dataset
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<HostCall> {
        self.calls
    }

    /// The stored result as `(discriminant, payload)`.
    pub fn last_result(&self) -> Option<(u32, &[u8])> {
        self.last_result
            .as_ref()
            .map(|(kind, payload)| (*kind, payload.as_slice()))
    }

    pub fn emit_count(&self) -> usize {
        self.emit_count
    }

    pub fn logs(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Log { message } => Some(String::from_utf8_lossy(message).into_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Progress { fraction } => Some(*fraction),
                _ => None,
            })
            .collect()
    }

    pub fn sleeps(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Sleep { seconds } => Some(*seconds),
                _ => None,
            })
            .collect()
    }
}

impl HostEnvironment for RecordingHost {
    fn dataset_len(&mut self) -> usize {
        let len = self.dataset.len();
        self.calls.push(HostCall::DatasetLen { len });
        len
    }

    fn dataset_write(&mut self, dest: &mut [u8]) {
        self.calls.push(HostCall::DatasetWrite { len: dest.len() });
        let n = dest.len().min(self.dataset.len());
        dest[..n].copy_from_slice(&self.dataset[..n]);
    }

    fn emit_result(&mut self, kind: ResultKind, payload: &[u8]) {
        let kind = kind.discriminant();
        self.calls.push(HostCall::Result {
            kind,
            payload: payload.to_vec(),
        });
        self.last_result = Some((kind, payload.to_vec()));
        self.emit_count += 1;
    }

    fn log(&mut self, message: &[u8]) {
        self.calls.push(HostCall::Log {
            message: message.to_vec(),
        });
    }

    fn progress(&mut self, fraction: f32) {
        self.calls.push(HostCall::Progress { fraction });
    }

    fn sleep(&mut self, seconds: f32) {
        self.calls.push(HostCall::Sleep { seconds });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_result_wins_and_count_accumulates() {
        let mut host = RecordingHost::new(b"data".to_vec());
        host.emit_result(ResultKind::Integer, &0i32.to_le_bytes());
        host.emit_result(ResultKind::String, b"final");
        assert_eq!(host.emit_count(), 2);
        assert_eq!(host.last_result(), Some((2, &b"final"[..])));
    }

    #[test]
    fn calls_serialize_with_import_tag() {
        let call = HostCall::Result {
            kind: 1,
            payload: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "import": "result", "kind": 1, "payload_b64": "AQID" })
        );
        let back: HostCall = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
    }
}

//! In-crate host double that records every import call in order.

use std::string::String;
use std::vec::Vec;

use crate::host::HostEnvironment;
use crate::result::ResultKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DatasetLen,
    DatasetWrite(usize),
    Emit(ResultKind, Vec<u8>),
    Log(Vec<u8>),
    Progress(f32),
    Sleep(f32),
}

#[derive(Debug, Default)]
pub struct TestHost {
    pub dataset: Vec<u8>,
    pub calls: Vec<Call>,
    /// Address of the last `dataset_write` destination.
    pub write_addr: Option<usize>,
}

impl TestHost {
    pub fn with_dataset(dataset: &[u8]) -> Self {
        TestHost {
            dataset: dataset.to_vec(),
            ..TestHost::default()
        }
    }

    pub fn logs(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Log(m) => Some(String::from_utf8_lossy(m).into_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn emits(&self) -> Vec<(ResultKind, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Emit(kind, payload) => Some((*kind, payload.clone())),
                _ => None,
            })
            .collect()
    }
}

impl HostEnvironment for TestHost {
    fn dataset_len(&mut self) -> usize {
        self.calls.push(Call::DatasetLen);
        self.dataset.len()
    }

    fn dataset_write(&mut self, dest: &mut [u8]) {
        self.calls.push(Call::DatasetWrite(dest.len()));
        self.write_addr = Some(dest.as_ptr() as usize);
        dest.copy_from_slice(&self.dataset);
    }

    fn emit_result(&mut self, kind: ResultKind, payload: &[u8]) {
        self.calls.push(Call::Emit(kind, payload.to_vec()));
    }

    fn log(&mut self, message: &[u8]) {
        self.calls.push(Call::Log(message.to_vec()));
    }

    fn progress(&mut self, fraction: f32) {
        self.calls.push(Call::Progress(fraction));
    }

    fn sleep(&mut self, seconds: f32) {
        self.calls.push(Call::Sleep(seconds));
    }
}

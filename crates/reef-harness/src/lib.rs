//! Host-side emulation of the Reef job ABI.
//!
//! Runs a job body through the real runtime over a `Vec`-backed memory and a
//! recording host, then summarizes the run as a JSON-serializable [`JobReport`].

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use reef_policy::AbiPolicy;
use reef_runtime::memory::VecMemory;
use reef_runtime::{Job, JobRun, LinearMemory};

mod decode;
mod host;
pub mod jobs;
mod report;

pub use decode::{decode_result, ResultValue};
pub use host::{HostCall, RecordingHost};
pub use jobs::ReferenceJob;
pub use report::{hex_lower, sha256_hex, DatasetReport, JobReport, MemoryReport, PolicyReport};

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub policy: AbiPolicy,
    pub initial_pages: usize,
    pub max_pages: usize,
    pub heap_base: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            policy: AbiPolicy::DEFAULT,
            initial_pages: 1,
            max_pages: VecMemory::DEFAULT_MAX_PAGES,
            heap_base: VecMemory::DEFAULT_HEAP_BASE,
        }
    }
}

/// Runs `body` once against `dataset` and reports what the host observed.
///
/// Ingestion failures and traps raised by the body end up in the report; only a
/// malformed result payload is an error.
pub fn simulate<F>(config: &SimulationConfig, dataset: &[u8], body: F) -> Result<JobReport>
where
    F: FnOnce(&mut Job<'_, &mut RecordingHost, &mut VecMemory>),
{
    let mut report = JobReport::new(config.policy, dataset);
    let mut host = RecordingHost::new(dataset);
    let mut memory = VecMemory::new(config.initial_pages, config.max_pages, config.heap_base);
    report.memory.heap_base = memory.heap_base();

    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        let outcome = JobRun::new(&mut host, &mut memory, config.policy).execute(body);
        (outcome.status, outcome.arena.high_water_mark())
    }));

    match run {
        Ok((Ok(summary), high_water_mark)) => {
            report.ok = true;
            report.policy.placeholder_emitted = summary.placeholder_emitted;
            report.dataset.allocated_len = Some(summary.allocated_len);
            report.memory.high_water_mark = Some(high_water_mark);
        }
        Ok((Err(failure), high_water_mark)) => {
            report.failure = Some(failure.to_string());
            report.trap = Some(failure.error.trap_code().to_string());
            report.memory.high_water_mark = Some(high_water_mark);
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "job panicked".to_string());
            report.failure = Some(message);
            report.trap = trap_code_of(report.failure.as_deref());
        }
    }

    report.memory.pages = memory.pages();
    report.memory.grow_calls = memory.grow_calls();
    report.emit_count = host.emit_count();
    report.result = host
        .last_result()
        .map(|(kind, payload)| decode_result(kind, payload))
        .transpose()?;
    report.logs = host.logs();
    report.progress = host.progress();
    report.sleeps = host.sleeps();
    report.calls = host.into_calls();
    Ok(report)
}

/// Dry run of one of the reference jobs.
pub fn simulate_reference(
    config: &SimulationConfig,
    dataset: &[u8],
    job: ReferenceJob,
) -> Result<JobReport> {
    simulate(config, dataset, |j| job.run(j))
}

fn trap_code_of(message: Option<&str>) -> Option<String> {
    message?
        .strip_prefix("reef trap ")
        .map(|code| code.to_string())
}

pub(crate) mod b64 {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

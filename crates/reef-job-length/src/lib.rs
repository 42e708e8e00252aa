//! A complete job module: reports the dataset length as an `Integer` result.
//!
//! Build for the host with
//! `cargo build -p reef-job-length --target wasm32-unknown-unknown --release`.

#![cfg_attr(target_arch = "wasm32", no_std)]

use reef_runtime::{HostEnvironment, Job, LinearMemory};

pub fn run<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    let len = job.dataset_len();
    reef_runtime::reef_log!(job, "dataset is {len} bytes");
    job.report_progress(1.0);
    job.emit_integer(i32::try_from(len).unwrap_or(i32::MAX));
}

reef_runtime::reef_job!(run);

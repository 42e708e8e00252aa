//! Small job bodies used for dry runs and as end-to-end fixtures.

use std::fmt;
use std::str::FromStr;

use reef_runtime::{prim, HostEnvironment, Job, LinearMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceJob {
    /// Emits the dataset back as a `Bytes` result.
    Echo,
    /// Logs and emits the dataset length as an `Integer` result.
    Length,
    /// Emits the wrapping byte sum of the dataset, reporting progress per quarter.
    Checksum,
    /// Greets a few times with pauses and progress, and emits nothing.
    Hello,
    /// Emits the wrapping sum of the dataset's big-endian 32-bit words. A dataset
    /// that is not a whole number of words traps the run.
    Words,
}

impl ReferenceJob {
    pub const ALL: [ReferenceJob; 5] = [
        ReferenceJob::Echo,
        ReferenceJob::Length,
        ReferenceJob::Checksum,
        ReferenceJob::Hello,
        ReferenceJob::Words,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceJob::Echo => "echo",
            ReferenceJob::Length => "length",
            ReferenceJob::Checksum => "checksum",
            ReferenceJob::Hello => "hello",
            ReferenceJob::Words => "words",
        }
    }

    pub fn run<H: HostEnvironment, M: LinearMemory>(self, job: &mut Job<'_, H, M>) {
        match self {
            ReferenceJob::Echo => echo(job),
            ReferenceJob::Length => length(job),
            ReferenceJob::Checksum => checksum(job),
            ReferenceJob::Hello => hello(job),
            ReferenceJob::Words => words(job),
        }
    }
}

impl fmt::Display for ReferenceJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceJob {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceJob::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| format!("unknown job {s:?} (expected echo, length, checksum, hello or words)"))
    }
}

pub fn echo<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    let (data, io) = job.split();
    io.emit_bytes(data);
}

pub fn length<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    let len = i32::try_from(job.dataset_len()).unwrap_or(i32::MAX);
    job.log_integer(len);
    job.emit_integer(len);
}

pub fn checksum<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    let (data, io) = job.split();
    let quarter = data.len().div_ceil(4).max(1);
    let mut sum = 0u32;
    for (i, chunk) in data.chunks(quarter).enumerate() {
        sum = chunk
            .iter()
            .fold(sum, |acc, &b| acc.wrapping_add(u32::from(b)));
        io.report_progress((i + 1) as f32 / data.len().div_ceil(quarter) as f32);
    }
    reef_runtime::reef_log!(io, "checksum of {} bytes: {sum:#010x}", data.len());
    io.emit_integer(sum as i32);
}

pub fn hello<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    const TIMES: u32 = 3;
    for i in 0..TIMES {
        job.log_str("Hello World!");
        job.yield_for(0.2);
        job.report_progress(i as f32 / TIMES as f32);
    }
}

pub fn words<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
    let (data, io) = job.split();
    match prim::swapped_words(data) {
        Ok(words) => {
            let sum = words.fold(0u32, u32::wrapping_add);
            io.emit_integer(sum as i32);
        }
        Err(err) => io.fail(err),
    }
}

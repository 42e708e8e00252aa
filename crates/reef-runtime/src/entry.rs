//! The entry point: ingest the dataset, run the job body once, hand control back.

use core::fmt;

use reef_policy::{AbiPolicy, ImplicitResult};

use crate::arena::{Arena, Region};
use crate::dataset::{self, Dataset};
use crate::error::RuntimeError;
use crate::host::HostEnvironment;
use crate::memory::LinearMemory;
use crate::result::{self, ResultEnvelope, ResultKind};
use crate::{log, progress, trap};

/// Lifecycle of a run. Transitions are linear and never revisit a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Ingesting,
    Running,
    Finalizing,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Ingesting => "ingesting",
            Phase::Running => "running",
            Phase::Finalizing => "finalizing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The job's view of the host: logging, progress and result emission.
pub struct Io<'h, H: ?Sized> {
    host: &'h mut H,
}

impl<'h, H: HostEnvironment + ?Sized> Io<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Io { host }
    }

    pub fn host(&mut self) -> &mut H {
        self.host
    }

    pub fn log_text(&mut self, message: Option<&[u8]>) {
        log::log_text(self.host, message);
    }

    pub fn log_bytes(&mut self, message: &[u8]) {
        log::log_bytes(self.host, message);
    }

    pub fn log_str(&mut self, message: &str) {
        log::log_str(self.host, message);
    }

    pub fn log_integer(&mut self, value: i32) {
        log::log_integer(self.host, value);
    }

    pub fn report_progress(&mut self, fraction: f32) {
        progress::report_progress(self.host, fraction);
    }

    pub fn yield_for(&mut self, seconds: f32) {
        progress::yield_for(self.host, seconds);
    }

    pub fn emit(&mut self, envelope: ResultEnvelope<'_>) {
        envelope.emit(self.host);
    }

    pub fn emit_integer(&mut self, value: i32) {
        result::emit_integer(self.host, value);
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        result::emit_bytes(self.host, bytes);
    }

    pub fn emit_string(&mut self, text: &[u8]) {
        result::emit_string(self.host, text);
    }

    pub fn emit_str(&mut self, text: &str) {
        result::emit_str(self.host, text);
    }

    /// Logs `err` and traps the instance. For failures the body cannot recover from,
    /// such as a primitive rejecting the dataset.
    pub fn fail(&mut self, err: impl Into<RuntimeError>) -> ! {
        trap::fatal(self.host, Phase::Running, &err.into())
    }
}

/// Everything a job body gets: the dataset, the arena for scratch space and the
/// host facade.
pub struct Job<'r, H, M> {
    io: Io<'r, H>,
    arena: &'r mut Arena<M>,
    dataset: Dataset,
    policy: AbiPolicy,
}

impl<'r, H: HostEnvironment, M: LinearMemory> Job<'r, H, M> {
    /// The dataset bytes, exactly `dataset_len()` of them.
    pub fn dataset(&self) -> &[u8] {
        self.dataset.bytes(&*self.arena)
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    pub fn policy(&self) -> AbiPolicy {
        self.policy
    }

    pub fn io(&mut self) -> &mut Io<'r, H> {
        &mut self.io
    }

    /// Borrows the dataset and the host facade at the same time, for jobs that
    /// stream their input into logs or results.
    pub fn split(&mut self) -> (&[u8], &mut Io<'r, H>) {
        (self.dataset.bytes(&*self.arena), &mut self.io)
    }

    /// Carves an 8-byte aligned scratch buffer from the arena. Never freed.
    pub fn try_alloc(&mut self, size: usize) -> Result<Region, RuntimeError> {
        Ok(self.arena.allocate(size, 8)?)
    }

    /// Like [`Job::try_alloc`], but an allocation failure traps the instance.
    pub fn alloc(&mut self, size: usize) -> Region {
        match self.try_alloc(size) {
            Ok(region) => region,
            Err(err) => self.io.fail(err),
        }
    }

    pub fn scratch(&mut self, region: Region) -> &mut [u8] {
        self.arena.bytes_mut(region)
    }

    pub fn scratch_ref(&self, region: Region) -> &[u8] {
        self.arena.bytes(region)
    }

    /// Emits the contents of an arena region as a `Bytes` or `String` result.
    /// `ResultKind::Integer` reads the first four bytes as the little-endian value.
    pub fn emit_region(&mut self, kind: ResultKind, region: Region) {
        let bytes = self.arena.bytes(region);
        match kind {
            ResultKind::Integer => {
                let mut raw = [0u8; 4];
                let n = bytes.len().min(4);
                raw[..n].copy_from_slice(&bytes[..n]);
                result::emit_integer(self.io.host, i32::from_le_bytes(raw));
            }
            ResultKind::Bytes => result::emit_bytes(self.io.host, bytes),
            ResultKind::String => result::emit_string(self.io.host, bytes),
        }
    }

    pub fn log_bytes(&mut self, message: &[u8]) {
        self.io.log_bytes(message);
    }

    pub fn log_str(&mut self, message: &str) {
        self.io.log_str(message);
    }

    pub fn log_integer(&mut self, value: i32) {
        self.io.log_integer(value);
    }

    pub fn report_progress(&mut self, fraction: f32) {
        self.io.report_progress(fraction);
    }

    pub fn yield_for(&mut self, seconds: f32) {
        self.io.yield_for(seconds);
    }

    pub fn emit(&mut self, envelope: ResultEnvelope<'_>) {
        self.io.emit(envelope);
    }

    pub fn emit_integer(&mut self, value: i32) {
        self.io.emit_integer(value);
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.io.emit_bytes(bytes);
    }

    pub fn emit_str(&mut self, text: &str) {
        self.io.emit_str(text);
    }

    pub fn fail(&mut self, err: impl Into<RuntimeError>) -> ! {
        self.io.fail(err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub policy: AbiPolicy,
    pub dataset_len: usize,
    pub allocated_len: usize,
    pub high_water_mark: usize,
    pub placeholder_emitted: bool,
}

/// A run that stopped before its job body finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunFailure {
    pub phase: Phase,
    pub error: RuntimeError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.error)
    }
}

/// What is left after a run: its status plus the host and arena, so callers can
/// inspect the transcript and memory.
pub struct RunOutcome<H, M> {
    pub status: Result<RunSummary, RunFailure>,
    pub host: H,
    pub arena: Arena<M>,
}

/// One job run over a host and a linear memory. `execute` consumes it, so a run
/// cannot be repeated.
pub struct JobRun<H, M> {
    host: H,
    arena: Arena<M>,
    policy: AbiPolicy,
    phase: Phase,
}

impl<H: HostEnvironment, M: LinearMemory> JobRun<H, M> {
    pub fn new(host: H, memory: M, policy: AbiPolicy) -> Self {
        JobRun {
            host,
            arena: Arena::new(memory),
            policy,
            phase: Phase::Ingesting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn execute<F>(mut self, body: F) -> RunOutcome<H, M>
    where
        F: FnOnce(&mut Job<'_, H, M>),
    {
        let status = self.drive(body);
        RunOutcome {
            status,
            host: self.host,
            arena: self.arena,
        }
    }

    fn drive<F>(&mut self, body: F) -> Result<RunSummary, RunFailure>
    where
        F: FnOnce(&mut Job<'_, H, M>),
    {
        self.phase = Phase::Ingesting;
        let dataset = dataset::ingest(&mut self.host, &mut self.arena, self.policy.granularity)
            .map_err(|err| RunFailure {
                phase: Phase::Ingesting,
                error: err.into(),
            })?;

        let placeholder_emitted = self.policy.implicit_result == ImplicitResult::PlaceholderZero;
        if placeholder_emitted {
            result::emit_integer(&mut self.host, 0);
        }

        self.phase = Phase::Running;
        {
            let mut job = Job {
                io: Io::new(&mut self.host),
                arena: &mut self.arena,
                dataset,
                policy: self.policy,
            };
            body(&mut job);
        }

        self.phase = Phase::Finalizing;
        Ok(RunSummary {
            policy: self.policy,
            dataset_len: dataset.len(),
            allocated_len: dataset.allocated_len(),
            high_water_mark: self.arena.high_water_mark(),
            placeholder_emitted,
        })
    }
}

/// Runs `body` against the module's own imports and memory, trapping on failure.
/// Called from the export generated by [`reef_job!`](crate::reef_job).
#[cfg(target_arch = "wasm32")]
pub fn run_module<F>(policy: AbiPolicy, body: F)
where
    F: FnOnce(&mut Job<'_, crate::host::ImportedHost, crate::memory::ModuleMemory>),
{
    // SAFETY: the entry export runs once per instance and the arena is the only
    // user of memory above the heap base.
    let memory = unsafe { crate::memory::ModuleMemory::take() };
    let outcome = JobRun::new(crate::host::ImportedHost::new(), memory, policy).execute(body);
    if let Err(failure) = outcome.status {
        let mut host = outcome.host;
        trap::fatal(&mut host, failure.phase, &failure.error);
    }
}

/// Generates the `reef_main` export for a job body.
///
/// The body must be generic over the host and the memory, so the same code runs in
/// the module and under emulation:
///
/// ```ignore
/// fn run<H: HostEnvironment, M: LinearMemory>(job: &mut Job<'_, H, M>) {
///     let len = job.dataset_len() as i32;
///     job.emit_integer(len);
/// }
///
/// reef_runtime::reef_job!(run);
/// // or, for hosts that expect the legacy template behavior:
/// reef_runtime::reef_job!(run, policy = reef_runtime::AbiPolicy::LEGACY);
/// ```
///
/// Besides the wasm32 export, the macro defines `REEF_JOB_POLICY` and
/// `reef_job_body` on every target. The body is type-checked on native builds too,
/// and a second invocation in the same module is a duplicate definition.
#[macro_export]
macro_rules! reef_job {
    ($body:path) => {
        $crate::reef_job!($body, policy = $crate::AbiPolicy::DEFAULT);
    };
    ($body:path, policy = $policy:expr) => {
        /// Policy the `reef_main` export runs with.
        pub const REEF_JOB_POLICY: $crate::AbiPolicy = $policy;

        /// The job body behind `reef_main`.
        pub fn reef_job_body<H: $crate::HostEnvironment, M: $crate::LinearMemory>(
            job: &mut $crate::Job<'_, H, M>,
        ) {
            $body(job)
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn reef_main() {
            $crate::entry::run_module(
                REEF_JOB_POLICY,
                reef_job_body::<$crate::host::ImportedHost, $crate::memory::ModuleMemory>,
            );
        }
    };
}

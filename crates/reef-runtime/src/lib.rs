//! Guest runtime for Reef job modules.
//!
//! A job crate depends on this crate, writes a body generic over `Job`'s host and
//! memory and exports it with [`reef_job!`]. The runtime ingests the host's dataset
//! into its arena, runs the body once and leaves result delivery to the body through
//! the `reef` imports.
//!
//! Everything that talks to the host goes through [`HostEnvironment`], so the same
//! code runs inside a wasm instance ([`host::ImportedHost`]) or against a recording
//! host with the `emulation` feature's [`memory::VecMemory`].

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "emulation"))]
extern crate alloc;

pub mod arena;
pub mod dataset;
pub mod entry;
pub mod error;
pub mod host;
pub mod log;
pub mod memory;
pub mod prim;
pub mod progress;
pub mod result;
pub mod trap;

#[cfg(test)]
mod testing;

pub use arena::{Arena, Region};
pub use dataset::Dataset;
pub use entry::{Io, Job, JobRun, Phase, RunFailure, RunOutcome, RunSummary};
pub use error::{AllocError, PrimitiveError, RuntimeError};
pub use host::HostEnvironment;
pub use memory::LinearMemory;
pub use result::{ResultEnvelope, ResultKind};

pub use reef_contracts as contracts;
pub use reef_policy::{AbiPolicy, Granularity, ImplicitResult};

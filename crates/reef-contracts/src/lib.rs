//! Shared, version-pinned ABI identifiers.
//!
//! These constants are the single source of truth for the names, discriminants and
//! sizes that cross the boundary between a Reef job module and its host. Guest code
//! (`reef-runtime`) and host-side tooling (`reef-harness`, `reef-abi`) both read them
//! from here; changing any value is a breaking change for every deployed host.

#![cfg_attr(not(test), no_std)]

pub const REEF_ABI_VERSION: u32 = 1;

pub const REEF_RUN_REPORT_SCHEMA_VERSION: &str = "reef.run.report@0.1.0";
pub const REEF_CONTRACT_SCHEMA_VERSION: &str = "reef.contract@0.1.0";

// --- module boundary ---

/// Wasm import module every host function lives under.
pub const IMPORT_MODULE: &str = "reef";

/// The single export the host calls once per job run: `() -> ()`.
pub const ENTRY_EXPORT: &str = "reef_main";

/// Linear memory export the host reads and writes through.
pub const MEMORY_EXPORT: &str = "memory";

// Import wire names. `emit_result` is exported under its historical wire name.
pub const IMPORT_DATASET_LEN: &str = "dataset_len";
pub const IMPORT_DATASET_WRITE: &str = "dataset_write";
pub const IMPORT_EMIT_RESULT: &str = "result";
pub const IMPORT_LOG: &str = "log";
pub const IMPORT_PROGRESS: &str = "progress";
pub const IMPORT_SLEEP: &str = "sleep";

pub const IMPORT_NAMES: [&str; 6] = [
    IMPORT_DATASET_LEN,
    IMPORT_DATASET_WRITE,
    IMPORT_EMIT_RESULT,
    IMPORT_LOG,
    IMPORT_PROGRESS,
    IMPORT_SLEEP,
];

// --- result envelope discriminants ---

pub const RESULT_KIND_INTEGER: u32 = 0;
pub const RESULT_KIND_BYTES: u32 = 1;
pub const RESULT_KIND_STRING: u32 = 2;

/// Byte width of an Integer result payload (little-endian `i32`).
pub const RESULT_INTEGER_WIDTH: usize = 4;

// --- memory layout ---

/// Wasm linear memory page size.
pub const PAGE_SIZE: usize = 65536;

/// Granularity of the small-buffer dataset rounding (`(len + 7) & !7`).
pub const WORD8_GRANULARITY: usize = 8;

/// Worst case `i32` rendering in base 10: sign, ten digits, terminator.
pub const LOG_INT_BUF_LEN: usize = 12;

/// Worst case `i32` rendering in base 2: sign, 32 digits, terminator.
pub const INT_TEXT_BUF_LEN: usize = 34;

pub const MIN_RADIX: u32 = 2;
pub const MAX_RADIX: u32 = 36;

// --- trap and error codes ---
//
// Keep these in sync with hosts that decode trap reasons from the log stream.

pub const REEF_TRAP_OUT_OF_MEMORY: i32 = 9300;
pub const REEF_TRAP_ADDRESS_OVERFLOW: i32 = 9301;
pub const REEF_TRAP_INVALID_ARGUMENT: i32 = 9302;

pub const REEF_ERR_INVALID_BASE: u32 = 70001;
pub const REEF_ERR_INVALID_LENGTH: u32 = 70002;
pub const REEF_ERR_OUT_OF_BOUNDS: u32 = 70003;

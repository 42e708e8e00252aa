use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reef_contracts::{
    ENTRY_EXPORT, IMPORT_DATASET_LEN, IMPORT_DATASET_WRITE, IMPORT_EMIT_RESULT, IMPORT_LOG,
    IMPORT_MODULE, IMPORT_PROGRESS, IMPORT_SLEEP, LOG_INT_BUF_LEN, MAX_RADIX, MEMORY_EXPORT,
    MIN_RADIX, PAGE_SIZE, REEF_ABI_VERSION, REEF_CONTRACT_SCHEMA_VERSION,
    REEF_TRAP_ADDRESS_OVERFLOW, REEF_TRAP_INVALID_ARGUMENT, REEF_TRAP_OUT_OF_MEMORY,
    RESULT_INTEGER_WIDTH, RESULT_KIND_BYTES, RESULT_KIND_INTEGER, RESULT_KIND_STRING,
    WORD8_GRANULARITY,
};
use reef_harness::{hex_lower, simulate_reference, ReferenceJob, SimulationConfig};
use reef_policy::{resolve_policy, Granularity, ImplicitResult};
use reef_runtime::prim;

#[derive(Parser)]
#[command(name = "reef-abi")]
#[command(about = "Reef job ABI: contract, primitives and dry runs.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the import/export contract as JSON.
    Contract,
    /// Render an integer the way the runtime's integer_to_text does.
    Itoa {
        #[arg(allow_hyphen_values = true)]
        value: i32,

        #[arg(long, default_value_t = 10)]
        base: u32,

        /// Fail on an invalid base instead of printing an empty line.
        #[arg(long)]
        strict: bool,
    },
    /// Swap the byte order of each 32-bit word of a hex string.
    Swap32 { hex: String },
    /// Run a reference job against a dataset file and print the JSON run report.
    Simulate {
        #[arg(long)]
        dataset: PathBuf,

        #[arg(long, default_value_t = ReferenceJob::Echo)]
        job: ReferenceJob,

        #[arg(long, value_enum)]
        granularity: Option<Granularity>,

        #[arg(long, value_enum)]
        implicit_result: Option<ImplicitResult>,

        #[arg(long, value_name = "PAGES")]
        max_pages: Option<usize>,

        /// Leave the full import call transcript out of the report.
        #[arg(long)]
        no_calls: bool,
    },
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Contract => {
            println!("{}", serde_json::to_string_pretty(&contract_json())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Itoa {
            value,
            base,
            strict,
        } => {
            let text = if strict {
                prim::try_integer_to_text(value, base).map_err(|err| {
                    anyhow::anyhow!("{err} (code {})", err.code())
                })?
            } else {
                prim::integer_to_text(value, base)
            };
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Swap32 { hex } => {
            let mut bytes = parse_hex(&hex)?;
            prim::swap_endian_32(&mut bytes)
                .map_err(|err| anyhow::anyhow!("{err} (code {})", err.code()))?;
            println!("{}", hex_lower(&bytes));
            Ok(ExitCode::SUCCESS)
        }
        Command::Simulate {
            dataset,
            job,
            granularity,
            implicit_result,
            max_pages,
            no_calls,
        } => {
            let policy = resolve_policy(granularity, implicit_result)?;
            let input = std::fs::read(&dataset)
                .with_context(|| format!("read dataset: {}", dataset.display()))?;
            let mut config = SimulationConfig {
                policy,
                ..SimulationConfig::default()
            };
            if let Some(max_pages) = max_pages {
                if max_pages == 0 {
                    bail!("--max-pages must be at least 1");
                }
                config.max_pages = max_pages;
            }

            let mut report = simulate_reference(&config, &input, job)?;
            if no_calls {
                report.calls.clear();
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

fn contract_json() -> serde_json::Value {
    serde_json::json!({
        "schema_version": REEF_CONTRACT_SCHEMA_VERSION,
        "abi_version": REEF_ABI_VERSION,
        "import_module": IMPORT_MODULE,
        "imports": [
            { "name": IMPORT_DATASET_LEN, "params": [], "results": ["i32"] },
            { "name": IMPORT_DATASET_WRITE, "params": ["i32"], "results": [] },
            { "name": IMPORT_EMIT_RESULT, "params": ["i32", "i32", "i32"], "results": [] },
            { "name": IMPORT_LOG, "params": ["i32", "i32"], "results": [] },
            { "name": IMPORT_PROGRESS, "params": ["f32"], "results": [] },
            { "name": IMPORT_SLEEP, "params": ["f32"], "results": [] },
        ],
        "exports": [
            { "name": ENTRY_EXPORT, "kind": "func", "params": [], "results": [] },
            { "name": MEMORY_EXPORT, "kind": "memory" },
        ],
        "result_kinds": [
            { "discriminant": RESULT_KIND_INTEGER, "kind": "integer", "width": RESULT_INTEGER_WIDTH, "encoding": "i32-le" },
            { "discriminant": RESULT_KIND_BYTES, "kind": "bytes" },
            { "discriminant": RESULT_KIND_STRING, "kind": "string" },
        ],
        "constants": {
            "page_size": PAGE_SIZE,
            "word8_granularity": WORD8_GRANULARITY,
            "log_int_buf_len": LOG_INT_BUF_LEN,
            "min_radix": MIN_RADIX,
            "max_radix": MAX_RADIX,
        },
        "traps": {
            "out_of_memory": REEF_TRAP_OUT_OF_MEMORY,
            "address_overflow": REEF_TRAP_ADDRESS_OVERFLOW,
            "invalid_argument": REEF_TRAP_INVALID_ARGUMENT,
        },
    })
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() % 2 != 0 {
        bail!("hex input has an odd number of digits ({})", s.len());
    }
    s.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = hex_digit(pair[0])?;
            let lo = hex_digit(pair[1])?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn hex_digit(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => bail!("invalid hex digit {:?}", c as char),
    }
}

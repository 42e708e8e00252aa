use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn reef_abi() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reef-abi"));
    cmd.env_remove("REEF_ALLOC_GRANULARITY");
    cmd.env_remove("REEF_IMPLICIT_RESULT");
    cmd
}

fn stdout_json(out: &Output) -> Value {
    serde_json::from_slice(&out.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}\nstderr: {}",
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        )
    })
}

fn write_temp(name: &str, contents: &[u8]) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    for n in 0..10_000u32 {
        let dir = base.join(format!("reef-abi-cli-{name}-{pid}-{n}"));
        if std::fs::create_dir(&dir).is_ok() {
            let path = dir.join("dataset.bin");
            std::fs::write(&path, contents).expect("write dataset");
            return path;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

#[test]
fn contract_lists_wire_names() {
    let out = reef_abi().arg("contract").output().expect("run reef-abi");
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["schema_version"], json!("reef.contract@0.1.0"));
    assert_eq!(v["import_module"], json!("reef"));
    let names: Vec<&str> = v["imports"]
        .as_array()
        .expect("imports")
        .iter()
        .map(|i| i["name"].as_str().expect("name"))
        .collect();
    assert_eq!(
        names,
        ["dataset_len", "dataset_write", "result", "log", "progress", "sleep"]
    );
    assert_eq!(v["exports"][0]["name"], json!("reef_main"));
    assert_eq!(v["constants"]["page_size"], json!(65536));
    assert_eq!(v["traps"]["invalid_argument"], json!(9302));
}

#[test]
fn itoa_matches_runtime_formatting() {
    let out = reef_abi()
        .args(["itoa", "255", "--base", "16"])
        .output()
        .expect("run reef-abi");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ff\n");

    let out = reef_abi().args(["itoa", "-7"]).output().expect("run reef-abi");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "-7\n");

    let out = reef_abi()
        .args(["itoa", "5", "--base", "40"])
        .output()
        .expect("run reef-abi");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "\n");

    let out = reef_abi()
        .args(["itoa", "5", "--base", "40", "--strict"])
        .output()
        .expect("run reef-abi");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid base 40"));
}

#[test]
fn swap32_swaps_words_and_rejects_partial_words() {
    let out = reef_abi()
        .args(["swap32", "0x0102030405060708"])
        .output()
        .expect("run reef-abi");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "0403020108070605\n");

    let out = reef_abi()
        .args(["swap32", "010203"])
        .output()
        .expect("run reef-abi");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("multiple of 4"));
}

#[test]
fn simulate_length_job_reports_result() {
    let path = write_temp("length", b"hello reef");
    let out = reef_abi()
        .args(["simulate", "--job", "length", "--dataset"])
        .arg(&path)
        .output()
        .expect("run reef-abi");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v = stdout_json(&out);
    assert_eq!(v["schema_version"], json!("reef.run.report@0.1.0"));
    assert_eq!(v["ok"], json!(true));
    assert_eq!(v["emit_count"], json!(1));
    assert_eq!(v["result"], json!({ "kind": "integer", "value": 10 }));
    assert_eq!(v["policy"]["granularity"], json!("page"));
    assert_eq!(v["dataset"]["allocated_len"], json!(65536));
}

#[test]
fn simulate_policy_flags_beat_environment() {
    let path = write_temp("policy", b"abc");
    let out = reef_abi()
        .env("REEF_ALLOC_GRANULARITY", "page")
        .env("REEF_IMPLICIT_RESULT", "placeholder-zero")
        .args(["simulate", "--job", "hello", "--granularity", "word8", "--no-calls", "--dataset"])
        .arg(&path)
        .output()
        .expect("run reef-abi");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v = stdout_json(&out);
    assert_eq!(v["policy"]["granularity"], json!("word8"));
    assert_eq!(v["policy"]["implicit_result"], json!("placeholder-zero"));
    assert_eq!(v["dataset"]["allocated_len"], json!(8));
    assert_eq!(v["emit_count"], json!(1));
    assert_eq!(v["result"], json!({ "kind": "integer", "value": 0 }));
    assert_eq!(v["calls"], json!([]));
}

#[test]
fn simulate_rejects_invalid_environment() {
    let path = write_temp("badenv", b"abc");
    let out = reef_abi()
        .env("REEF_ALLOC_GRANULARITY", "huge")
        .args(["simulate", "--dataset"])
        .arg(&path)
        .output()
        .expect("run reef-abi");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("REEF_ALLOC_GRANULARITY"), "stderr: {stderr}");
}

#[test]
fn simulate_out_of_memory_exits_one() {
    let path = write_temp("oom", &vec![1u8; 2 * 65536]);
    let out = reef_abi()
        .args(["simulate", "--max-pages", "2", "--dataset"])
        .arg(&path)
        .output()
        .expect("run reef-abi");
    assert_eq!(out.status.code(), Some(1));
    let v = stdout_json(&out);
    assert_eq!(v["ok"], json!(false));
    assert_eq!(v["trap"], json!("9300"));
}

#[test]
fn simulate_words_job_traps_on_partial_word() {
    let path = write_temp("words", b"abcde");
    let out = reef_abi()
        .args(["simulate", "--job", "words", "--dataset"])
        .arg(&path)
        .output()
        .expect("run reef-abi");
    assert_eq!(out.status.code(), Some(1));
    let v = stdout_json(&out);
    assert_eq!(v["trap"], json!("9302"));
}

// Integration tests for the `rmerge` binary: exit codes, output files and
// the --json stdout contract.
//
// Run with: cargo test -p recordmerge-cli --test cli_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

fn rmerge() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rmerge"));
    cmd.env_remove("RMERGE_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

const RECORDS: &str = "\
center,email,locality,date,commitments
IES Lope de Vega,,Madrid,01/03/2024,reciclaje
Lope de Vega,info@lope.es,Madrid,15/01/2024,huerto
Quevedo,,Soria,,
";

const CONFIG: &str = r#"
name = "Centros"
strategy = "review"

[input]
file = "records.csv"
source = "form"
"#;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "records.csv", RECORDS);
    write(dir.path(), "dedup.toml", CONFIG);
    dir
}

#[test]
fn validate_accepts_good_config() {
    let dir = workspace();
    let out = rmerge()
        .args(["validate", dir.path().join("dedup.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("config OK: Centros"));
}

#[test]
fn validate_rejects_bad_threshold() {
    let dir = workspace();
    write(dir.path(), "bad.toml", "[thresholds]\nemail = 1.2\n");
    let out = rmerge()
        .args(["validate", dir.path().join("bad.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(60));
    assert!(stderr(&out).contains("email"));
}

#[test]
fn unknown_strategy_flag_is_usage_error() {
    let dir = workspace();
    let out = rmerge()
        .args(["run", dir.path().join("dedup.toml").to_str().unwrap(), "--strategy", "fuse"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_config_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = rmerge()
        .args(["run", dir.path().join("nope.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn run_merge_writes_csv_and_report() {
    let dir = workspace();
    let csv_out = dir.path().join("out.csv");
    let report = dir.path().join("report.json");

    let out = rmerge()
        .args([
            "run",
            dir.path().join("dedup.toml").to_str().unwrap(),
            "--strategy",
            "merge",
            "--output",
            csv_out.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("3 records in, 2 out"));

    let csv = std::fs::read_to_string(&csv_out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("representative,center,email"));
    // the record with an email is the merge base
    assert!(lines[1].contains("Lope de Vega,info@lope.es"));
    assert!(lines[1].contains("\"huerto, reciclaje\""));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["meta"]["strategy"], "merge");
    assert_eq!(json["summary"]["groups"], 1);
}

#[test]
fn run_json_prints_single_document() {
    let dir = workspace();
    let out = rmerge()
        .args(["run", dir.path().join("dedup.toml").to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["processed_records"].as_array().unwrap().len(), 3);
    assert_eq!(json["processed_records"][0]["review"]["group_id"], 1);
}

#[test]
fn missing_column_is_runtime_error() {
    let dir = workspace();
    write(dir.path(), "records.csv", "name,email\nLope,\n");
    let out = rmerge()
        .args(["run", dir.path().join("dedup.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("missing column 'center'"));
}

#[test]
fn empty_input_is_a_no_op() {
    let dir = workspace();
    write(dir.path(), "records.csv", "center,email\n");
    let out = rmerge()
        .args(["run", dir.path().join("dedup.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("nothing to do"));
}

#[test]
fn cross_mode_from_against_section() {
    let dir = workspace();
    write(dir.path(), "registry.csv", "center,locality\nLope de Vega,Madrid\n");
    write(
        dir.path(),
        "cross.toml",
        &format!("{CONFIG}\n[against]\nfile = \"registry.csv\"\nsource = \"registry\"\n"),
    );
    let out = rmerge()
        .args(["run", dir.path().join("cross.toml").to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let json: serde_json::Value =
        serde_json::from_str(String::from_utf8(out.stdout.clone()).unwrap().trim()).unwrap();
    assert_eq!(json["meta"]["mode"], "cross_collection");
    // both Lope de Vega rows collapse into the registry row; Quevedo passes through
    assert_eq!(json["processed_records"].as_array().unwrap().len(), 2);
    assert_eq!(json["summary"]["duplicates"], 2);
    assert!(stderr(&out).contains("cross-check"));
}

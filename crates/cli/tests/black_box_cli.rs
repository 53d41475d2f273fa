use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// The binary with a pinned environment so host settings cannot leak in.
fn settleup() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_settleup"));
    cmd.env("SETTLEUP_CURRENCY", "PHP")
        .env_remove("SETTLEUP_MATCHING")
        .env("RUST_LOG", "off");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn settleup");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("settleup did not finish")
}

fn report(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "settleup failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not a JSON report")
}

fn payments(report: &Value) -> Vec<(String, String, i64)> {
    report["transactions"]
        .as_array()
        .expect("transactions array")
        .iter()
        .map(|tx| {
            (
                tx["from"].as_str().unwrap().to_string(),
                tx["to"].as_str().unwrap().to_string(),
                tx["amount"]["minor"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn pay(from: &str, to: &str, minor: i64) -> (String, String, i64) {
    (from.to_string(), to.to_string(), minor)
}

/// A pays 150.00 for C (120.00) and D (30.00); B pays 50.00 for D.
const FOUR_MEMBERS: &str = r#"[
    {
        "amount": { "minor": 15000, "currency": "PHP" },
        "payer": "A",
        "policy": {
            "kind": "exact",
            "split": {
                "C": { "minor": 12000, "currency": "PHP" },
                "D": { "minor": 3000, "currency": "PHP" }
            }
        },
        "participants": ["A", "C", "D"]
    },
    {
        "amount": { "minor": 5000, "currency": "PHP" },
        "payer": "B",
        "policy": {
            "kind": "exact",
            "split": { "D": { "minor": 5000, "currency": "PHP" } }
        },
        "participants": ["B", "D"]
    }
]"#;

#[test]
fn reads_a_file_and_prints_the_report() {
    let mut cmd = settleup();
    cmd.arg(fixture("dinner.json"));
    let output = cmd.output().expect("failed to run settleup");
    let report = report(&output);

    assert_eq!(report["currency"], "PHP");
    assert_eq!(report["balances"].as_array().unwrap().len(), 3);
    assert_eq!(
        payments(&report),
        vec![pay("B", "A", 10_000), pay("C", "A", 10_000)]
    );
}

#[test]
fn reads_stdin_when_no_file_is_given() {
    let input = std::fs::read_to_string(fixture("dinner.json")).unwrap();
    let report = report(&run_with_stdin(settleup(), &input));
    assert_eq!(
        payments(&report),
        vec![pay("B", "A", 10_000), pay("C", "A", 10_000)]
    );
}

#[test]
fn matching_flag_selects_the_strategy() {
    let sequential = report(&run_with_stdin(settleup(), FOUR_MEMBERS));
    assert_eq!(
        payments(&sequential),
        vec![pay("C", "A", 12_000), pay("D", "A", 3_000), pay("D", "B", 5_000)]
    );

    let mut cmd = settleup();
    cmd.args(["--matching", "resorting"]);
    let resorting = report(&run_with_stdin(cmd, FOUR_MEMBERS));
    assert_eq!(
        payments(&resorting),
        vec![pay("C", "A", 12_000), pay("D", "B", 5_000), pay("D", "A", 3_000)]
    );
}

#[test]
fn matching_flag_overrides_the_environment() {
    let mut cmd = settleup();
    cmd.env("SETTLEUP_MATCHING", "resorting")
        .args(["--matching", "sequential"]);
    let report = report(&run_with_stdin(cmd, FOUR_MEMBERS));
    assert_eq!(payments(&report)[1], pay("D", "A", 3_000));
}

#[test]
fn currency_flag_overrides_the_environment() {
    let mut cmd = settleup();
    cmd.args(["--currency", "USD", &fixture("dinner_usd.json")]);
    let report = report(&cmd.output().expect("failed to run settleup"));
    assert_eq!(report["currency"], "USD");
    assert_eq!(payments(&report), vec![pay("B", "A", 6_000)]);
}

#[test]
fn currency_mismatch_exits_with_failure() {
    let mut cmd = settleup();
    cmd.arg(fixture("dinner_usd.json"));
    let output = cmd.output().expect("failed to run settleup");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn malformed_input_exits_with_failure() {
    let output = run_with_stdin(settleup(), "{ not json");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("JSON array of expenses"));
}

#[test]
fn invalid_expense_exits_with_failure() {
    let input = r#"[{
        "amount": { "minor": 1000, "currency": "PHP" },
        "payer": "A",
        "policy": { "kind": "equal" },
        "participants": []
    }]"#;
    let output = run_with_stdin(settleup(), input);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no participants"));
}

#[test]
fn missing_file_exits_with_failure() {
    let mut cmd = settleup();
    cmd.arg(fixture("does_not_exist.json"));
    let output = cmd.output().expect("failed to run settleup");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

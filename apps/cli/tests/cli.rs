use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// Run the binary from an empty directory so no stray topocause.toml is picked up.
fn topocause(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_topocause"))
        .args(args)
        .current_dir(cwd)
        .env_remove("TOPOCAUSE_CONFIG")
        .output()
        .expect("failed to run topocause")
}

fn json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn path(p: PathBuf) -> String {
    p.to_string_lossy().into_owned()
}

#[test]
fn test_analyze_finds_silent_switch() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &[
            "analyze",
            "--json",
            "-t",
            &path(demos().join("campus.yaml")),
            "-a",
            &path(demos().join("silent-switch.json")),
        ],
    );
    let report = json(&out);

    assert_eq!(report["status"], "down");
    assert_eq!(report["candidates"][0]["device_id"], "L2_SW_01");
    assert_eq!(report["candidates"][0]["kind"], "Network/SilentFailure");
    assert!(report.get("alternative").is_none());
}

#[test]
fn test_analyze_ha_member_with_dataset() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &[
            "analyze",
            "--json",
            "-t",
            &path(demos().join("campus.yaml")),
            "-a",
            &path(demos().join("ha-failover.toml")),
            "-d",
            &path(demos().join("incidents.json")),
        ],
    );
    let report = json(&out);

    let top = &report["candidates"][0];
    assert_eq!(top["device_id"], "FW_01_PRIMARY");
    assert!(top["confidence"].as_f64().unwrap() <= 0.8);
    assert_ne!(report["status"], "down");
    assert_eq!(report["alternative"][0]["device_id"], "FW_01_PRIMARY");
}

#[test]
fn test_simulate_and_analyze_cascade() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &[
            "simulate",
            "--json",
            "--analyze",
            "-t",
            &path(demos().join("campus.yaml")),
            "--root",
            "CORE_SW_01",
        ],
    );
    let report = json(&out);

    let alarms = report["alarms"].as_array().unwrap();
    // root, L2 switch, four access points
    assert_eq!(alarms.len(), 6);
    assert_eq!(alarms[0]["severity"], "CRITICAL");
    assert_eq!(report["candidates"][0]["device_id"], "CORE_SW_01");
    assert_eq!(report["status"], "down");
}

#[test]
fn test_default_cascade_from_dual_psu_wan_router() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &[
            "simulate",
            "--json",
            "--analyze",
            "-t",
            &path(demos().join("campus.yaml")),
            "--root",
            "WAN_ROUTER_01",
        ],
    );
    let report = json(&out);

    let candidates = report["candidates"].as_array().unwrap();
    assert_eq!(report["status"], "down");
    assert_eq!(candidates[0]["device_id"], "WAN_ROUTER_01");
    assert_eq!(candidates[0]["kind"], "Network/Link");
    let confirmed: Vec<&str> = candidates
        .iter()
        .filter(|c| c["confidence"].as_f64().unwrap() > 0.8)
        .map(|c| c["device_id"].as_str().unwrap())
        .collect();
    assert_eq!(confirmed, vec!["WAN_ROUTER_01"]);
    assert!(candidates[1..]
        .iter()
        .all(|c| c["kind"] == "Network/Secondary" && c["confidence"].as_f64().unwrap() <= 0.5));
}

#[test]
fn test_unknown_root_fails_with_help() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &["simulate", "-t", &path(demos().join("campus.yaml")), "--root", "CORE_SW_09"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown device: CORE_SW_09"));
    assert!(stderr.contains("help:"));
}

#[test]
fn test_bayes_skips_unlearned_evidence() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &[
            "bayes",
            "--json",
            "-d",
            &path(demos().join("incidents.json")),
            "-e",
            "alarm=BGP Flapping",
            "-e",
            "alarm=Solar Flare",
        ],
    );
    let report = json(&out);

    assert_eq!(report["applied"], serde_json::json!(["alarm=BGP Flapping"]));
    assert_eq!(report["skipped"], serde_json::json!(["alarm=Solar Flare"]));
    let total: f64 = report["posteriors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["posterior"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(report["ranking"][0]["kind"], "Config/Software");
}

#[test]
fn test_scenarios_search() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(tmp.path(), &["scenarios", "search", "silent", "--json"]);
    let hits = json(&out);
    assert_eq!(hits[0]["id"], "l2sw_silent");
}

#[test]
fn test_status_reads_config_relative_to_file() {
    let tmp = TempDir::new().unwrap();
    let out = topocause(
        tmp.path(),
        &["status", "--json", "-c", &path(demos().join("topocause.toml"))],
    );
    let entries = json(&out);
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["network"], "branch");
    assert_eq!(entries[0]["status"], "normal");
    assert_eq!(entries[1]["network"], "campus");
    assert_eq!(entries[1]["status"], "down");
    assert!(entries[1]["alternative"].is_array());
}

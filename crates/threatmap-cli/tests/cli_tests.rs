//! Integration tests for the threatmap CLI.
//!
//! Every test points `--data-path` at a fresh temporary store so the
//! platform data directory is never touched.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct TestEnv {
    temp_dir: TempDir,
    store_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store_path = temp_dir.path().join("threats.json");
        Self {
            temp_dir,
            store_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("threatmap-cli").expect("binary exists");
        cmd.env_remove("THREATMAP_DATA_PATH")
            .env_remove("THREATMAP_ADVISOR_URL")
            .env_remove("THREATMAP_FACILITIES_PATH")
            .arg("--data-path")
            .arg(&self.store_path);
        cmd
    }

    fn write_facilities(&self, json: &str) -> PathBuf {
        let path = self.temp_dir.path().join("facilities.json");
        fs::write(&path, json).expect("write facilities");
        path
    }
}

#[test]
fn zones_json_lists_four_bands() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["--format", "json", "zones", "--yield-kg", "1000"])
        .output()
        .expect("run zones");
    assert!(output.status.success());

    let zones: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let zones = zones.as_array().expect("array");
    assert_eq!(zones.len(), 4);
    assert_eq!(zones[3]["radiusMeters"], 2000.0);
}

#[test]
fn first_list_shows_sentinel() {
    let env = TestEnv::new();
    env.cmd()
        .args(["threats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-threat-001"));
    assert!(env.store_path.exists());
}

#[test]
fn add_then_remove_round_trip() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args([
            "--format",
            "json",
            "threats",
            "add",
            "--name",
            "Gas Leak",
            "--lat",
            "12.97",
            "--lng",
            "77.59",
            "--yield-kg",
            "8",
            "--duration-minutes",
            "30",
            "--source",
            "simulation-news",
        ])
        .output()
        .expect("run add");
    assert!(output.status.success());

    let added: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let id = added["id"].as_str().expect("id").to_string();
    assert_eq!(added["source"], "simulation_news");
    assert!(added["expiresAt"].is_string());

    env.cmd()
        .args(["threats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gas Leak"));

    env.cmd()
        .args(["threats", "remove", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed threat"));

    env.cmd()
        .args(["threats", "remove", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no removable threat"));
}

#[test]
fn invalid_yield_is_rejected_and_store_stays_readable() {
    let env = TestEnv::new();
    for bad in ["NaN", "inf", "-5"] {
        env.cmd()
            .args([
                "threats",
                "add",
                "--name",
                "Bad",
                "--lat",
                "12.97",
                "--lng",
                "77.59",
                &format!("--yield-kg={bad}"),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to add threat"));
    }

    env.cmd()
        .args(["threats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-threat-001"));
}

#[test]
fn huge_duration_is_rejected() {
    let env = TestEnv::new();
    env.cmd()
        .args([
            "threats",
            "add",
            "--name",
            "Forever",
            "--lat",
            "12.97",
            "--lng",
            "77.59",
            "--duration-minutes",
            "4611686018427387903",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --duration-minutes"));
}

#[test]
fn sentinel_cannot_be_removed() {
    let env = TestEnv::new();
    env.cmd()
        .args(["threats", "remove", "test-threat-001"])
        .assert()
        .failure();
}

#[test]
fn seed_demo_then_clear() {
    let env = TestEnv::new();
    env.cmd()
        .args(["threats", "seed-demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 3 demo threats (4 total)"));

    env.cmd()
        .args(["threats", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 3 ephemeral threats (1 remaining)"));

    env.cmd()
        .args(["threats", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 0 ephemeral threats (1 remaining)"));
}

#[test]
fn reconcile_drops_demo_threats() {
    let env = TestEnv::new();
    env.cmd().args(["threats", "seed-demo"]).assert().success();

    let output = env
        .cmd()
        .args(["--format", "json", "threats", "reconcile"])
        .output()
        .expect("run reconcile");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["removed_ephemeral"], 3);
    assert_eq!(report["total_after"], 1);
}

#[test]
fn corrupt_store_is_reported() {
    let env = TestEnv::new();
    fs::write(&env.store_path, "not json").expect("write corrupt store");

    env.cmd()
        .args(["threats", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn evacuate_inside_sentinel_zone_uses_catalog() {
    let env = TestEnv::new();
    // The sentinel at (13.013251, 77.624151) has a ~3.95 km danger radius.
    let facilities = env.write_facilities(
        r#"[
            {"name": "Too Close Hospital", "types": ["hospital"], "location": {"lat": 13.0140, "lng": 77.6300}},
            {"name": "East Side Hospital", "types": ["hospital"], "location": {"lat": 13.0135, "lng": 77.6680}}
        ]"#,
    );

    let output = env
        .cmd()
        .args(["--format", "json", "evacuate", "--lat", "13.0133", "--lng", "77.6300"])
        .arg("--facilities")
        .arg(&facilities)
        .output()
        .expect("run evacuate");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(outcome["status"], "route");
    assert_eq!(outcome["resolved"]["isInside"], true);
    assert_eq!(outcome["decision"]["selectionTag"], "advisor-fallback");
    assert_eq!(outcome["decision"]["facilityName"], "East Side Hospital");
    assert!(outcome["decision"]["waypointLocation"].is_object());
}

#[test]
fn evacuate_without_catalog_routes_to_safe_exit() {
    let env = TestEnv::new();
    env.cmd()
        .args(["evacuate", "--lat", "13.02", "--lng", "77.62"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no-hospital-safe-only"))
        .stdout(predicate::str::contains("https://www.google.com/maps/dir/?api=1"));
}

//! Black-box tests of the `sectiond` binary.

mod support;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use support::catalog::sample_catalog_path;
use support::config::{config_with_catalog, write_temp_config};

fn sectiond() -> Command {
    let mut cmd = cargo_bin_cmd!("sectiond");
    cmd.env_remove("RUST_LOG")
        .env_remove("SECTIONS_CATALOG_PATH")
        .arg("--color")
        .arg("never");
    cmd
}

#[test]
fn test_help() {
    sectiond()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("configs"))
        .stdout(predicate::str::contains("insights"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version() {
    sectiond()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sectiond"));
}

#[test]
fn check_accepts_valid_config() {
    let (_dir, path) = write_temp_config(&config_with_catalog(&sample_catalog_path()));

    sectiond()
        .arg("check")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"));
}

#[test]
fn check_reports_json_summary() {
    let (_dir, path) = write_temp_config(&config_with_catalog(&sample_catalog_path()));

    let output = sectiond()
        .args(["--json", "check", "--config"])
        .arg(&path)
        .output()
        .expect("run sectiond");

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report["valid"], true);
    assert_eq!(report["catalogScreens"], 24);
}

#[test]
fn check_returns_nonzero_on_invalid_config() {
    let (_dir, path) = write_temp_config("[grouping]\nmax_sections = 0\n");

    sectiond()
        .arg("check")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_sections"));
}

#[test]
fn check_returns_nonzero_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    sectiond()
        .arg("check")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn generate_json_is_a_single_document_on_stdout() {
    let dir = tempfile::tempdir().unwrap();

    let output = sectiond()
        .args(["--json", "generate", "--location", "Bogotá", "--catalog"])
        .arg(sample_catalog_path())
        .arg("--config")
        .arg(dir.path().join("defaults.toml"))
        .output()
        .expect("run sectiond");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let sections = result["sections"].as_array().expect("sections array");
    assert!(!sections.is_empty());
    assert_eq!(result["cacheHit"], false);
    assert!(result["analytics"]["requestId"].is_string());
}

#[test]
fn generate_honors_max_sections() {
    let dir = tempfile::tempdir().unwrap();

    let output = sectiond()
        .args(["--json", "generate", "-u", "u1", "-m", "2", "--catalog"])
        .arg(sample_catalog_path())
        .arg("--config")
        .arg(dir.path().join("defaults.toml"))
        .output()
        .expect("run sectiond");

    assert!(output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(result["sections"].as_array().unwrap().len() <= 2);
}

#[test]
fn generate_renders_section_table() {
    let (_dir, path) = write_temp_config(&config_with_catalog(&sample_catalog_path()));

    sectiond()
        .args(["generate", "--location", "Cali", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sections"))
        .stdout(predicate::str::contains("trending-now"));
}

#[test]
fn configs_lists_public_sections_for_anonymous_user() {
    let (_dir, path) = write_temp_config(&config_with_catalog(&sample_catalog_path()));

    let output = sectiond()
        .args(["--json", "configs", "--config"])
        .arg(&path)
        .output()
        .expect("run sectiond");

    assert!(output.status.success());
    let configs: Value = serde_json::from_slice(&output.stdout).unwrap();
    let configs = configs.as_array().expect("configs array");
    let top_picks = configs
        .iter()
        .find(|c| c["id"] == "top-picks")
        .expect("top-picks listed");
    assert_eq!(top_picks["eligible"], false);
    let popular = configs.iter().find(|c| c["id"] == "popular").unwrap();
    assert_eq!(popular["eligible"], true);
}

#[test]
fn insights_summarize_location_market() {
    let (_dir, path) = write_temp_config(&config_with_catalog(&sample_catalog_path()));

    let output = sectiond()
        .args(["--json", "insights", "--location", "Medellín", "--config"])
        .arg(&path)
        .output()
        .expect("run sectiond");

    assert!(output.status.success());
    let insights: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(insights["location"], "Medellín");
    assert!(insights["totalScreens"].as_u64().unwrap() > 0);
    assert!(!insights["topCategories"].as_array().unwrap().is_empty());
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    sectiond()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

//! Integration tests for the vkdiag binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn video_root() -> Value {
    json!({ "CurrentControlSet": { "Control": { "Video": {} } } })
}

fn snapshot_with_implicit_layer(layer_path: &str) -> Value {
    json!({
        "HKEY_LOCAL_MACHINE": {
            "SYSTEM": video_root(),
            "SOFTWARE": {
                "Khronos": {
                    "Vulkan": {
                        "ImplicitLayers": { layer_path: 0 }
                    }
                }
            }
        }
    })
}

fn write_snapshot(temp: &TempDir, snapshot: &Value) -> PathBuf {
    let path = temp.path().join("registry.json");
    fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
    path
}

fn vkdiag(temp: &TempDir, snapshot: &Path) -> Command {
    let config = temp.path().join("config.yml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::new(cargo_bin("vkdiag"));
    cmd.env_remove("VKDIAG_FIX")
        .env_remove("VKDIAG_SNAPSHOT")
        .arg("--config")
        .arg(&config)
        .arg("--snapshot")
        .arg(snapshot)
        .arg("--no-update-check")
        .arg("--non-interactive");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("vkdiag"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Vulkan driver and layer registration diagnostics"))
        .stdout(predicate::str::contains("--clear-explicit-driver-reg"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("vkdiag"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_a_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("vkdiag"));
    cmd.env_remove("VKDIAG_SNAPSHOT")
        .args(["--no-update-check", "--non-interactive"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No registry snapshot given"));
    Ok(())
}

#[test]
fn cli_reports_missing_snapshot_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = vkdiag(&temp, &temp.path().join("nope.json"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Registry snapshot not found"));
    Ok(())
}

#[test]
fn cli_rejects_malformed_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let snapshot = write_snapshot(&temp, &json!({ "HKEY_CLASSES_ROOT": {} }));
    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid registry snapshot"));
    Ok(())
}

#[test]
fn cli_rejects_names_differing_only_by_case() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let snapshot = write_snapshot(
        &temp,
        &json!({
            "HKEY_LOCAL_MACHINE": {
                "SOFTWARE": {
                    "Khronos": {
                        "Vulkan": {
                            "ImplicitLayers": { "C:\\gone\\a.json": 0, "c:\\GONE\\A.json": 0 }
                        }
                    }
                }
            }
        }),
    );
    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.arg("-f");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid registry snapshot"))
        .stderr(predicate::str::contains("only by case"));
    Ok(())
}

#[test]
fn cli_reports_clean_machine() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let snapshot = write_snapshot(&temp, &json!({ "HKEY_LOCAL_MACHINE": { "SYSTEM": video_root() } }));
    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "[+] VkDiag version: {}",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("Found 0 active GPUs:"))
        .stdout(predicate::str::contains("Vulkan registration information:"))
        .stdout(predicate::str::contains(
            "[+] No 64-bit implicit layers registered in HKEY_CURRENT_USER",
        ))
        .stdout(predicate::str::contains("Everything seems to be fine."))
        .stdout(predicate::str::contains("Remember to screenshot"));
    Ok(())
}

#[test]
fn cli_lists_valid_layer() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let manifest = temp.path().join("capture_layer.json");
    fs::write(
        &manifest,
        r#"{"file_format_version": "1.0.0", "layer": {"name": "VK_LAYER_capture", "api_version": "1.3.0", "description": "Capture Layer"}}"#,
    )?;
    let snapshot = write_snapshot(
        &temp,
        &snapshot_with_implicit_layer(&manifest.to_string_lossy()),
    );

    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[+] Implicit layers registration (HKEY_LOCAL_MACHINE, 64-bit):"))
        .stdout(predicate::str::contains("    [+] Capture, API v1.3.0 (capture_layer.json)"));
    Ok(())
}

#[test]
fn cli_offers_fix_for_broken_layer() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let missing = temp.path().join("missing_layer.json");
    let snapshot = write_snapshot(
        &temp,
        &snapshot_with_implicit_layer(&missing.to_string_lossy()),
    );

    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("    [x] missing_layer.json"))
        .stdout(predicate::str::contains("[f] Remove broken entries"))
        .stdout(predicate::str::contains("[n] Do nothing and exit (default)"))
        .stdout(predicate::str::contains("Selected option: n"))
        .stdout(predicate::str::contains("Everything seems to be fine.").not());
    Ok(())
}

#[test]
fn cli_applies_menu_choice_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let missing = temp.path().join("missing_layer.json");
    let missing = missing.to_string_lossy().to_string();
    let snapshot = write_snapshot(&temp, &snapshot_with_implicit_layer(&missing));
    let output = temp.path().join("fixed.json");

    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.env("VKDIAG_FIX", "f").arg("--output").arg(&output);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Selected option: f"))
        .stdout(predicate::str::contains(
            "[+] No 64-bit implicit layers registered in HKEY_LOCAL_MACHINE",
        ))
        .stdout(predicate::str::contains("Everything seems to be fine."));

    let fixed = fs::read_to_string(&output)?;
    assert!(!fixed.contains("missing_layer.json"));
    assert!(fixed.contains("ImplicitLayers"));
    Ok(())
}

#[test]
fn cli_fix_flag_repairs_without_menu() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let missing = temp.path().join("missing_layer.json");
    let snapshot = write_snapshot(
        &temp,
        &snapshot_with_implicit_layer(&missing.to_string_lossy()),
    );
    let output = temp.path().join("fixed.json");

    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.arg("-f").arg("--output").arg(&output);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Remove broken entries").not())
        .stdout(predicate::str::contains("Everything seems to be fine."));

    let original = fs::read_to_string(&snapshot)?;
    assert!(original.contains("missing_layer.json"));
    assert!(!fs::read_to_string(&output)?.contains("missing_layer.json"));
    Ok(())
}

#[test]
fn cli_rejects_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("config.yml"), "drivers: [unclosed")?;
    let snapshot = write_snapshot(&temp, &json!({ "HKEY_LOCAL_MACHINE": { "SYSTEM": video_root() } }));

    let mut cmd = vkdiag(&temp, &snapshot);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
    Ok(())
}

#[test]
fn cli_generates_completions() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("vkdiag"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("vkdiag"));
    Ok(())
}

//! Integration tests for a full `fleet-rail` publish run

use crate::helpers::{TestWorkspace, assert_success, run_fleet_rail};
use anyhow::Result;

#[test]
fn test_publish_services_end_to_end() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.publish("linux;win", "services", "nightly", "42")?;
  assert_success(&output);

  assert_eq!(
    ws.calls(),
    vec![
      "pack ood-daemon linux",
      "pack ood-daemon win",
      "upload ood-daemon",
      "set_version svc-ood fid-ood-daemon 1.1.0.42",
      "pack gateway linux",
      "pack gateway win",
      "upload gateway",
      "set_version svc-gateway fid-gateway 1.1.0.42",
    ]
  );

  let manifest = ws.read_json("dist/manifest.json")?;
  assert_eq!(
    manifest,
    serde_json::json!([
      { "id": "svc-ood", "version": "1.1.0.42", "status": "active" },
      { "id": "svc-gateway", "version": "1.1.0.42", "status": "active" },
    ])
  );

  assert!(!ws.file_exists(".fleet-rail/steps.json"), "step table removed after success");
  assert!(ws.file_exists("dist/artifacts/ood-daemon/ood-daemon-linux.zip"));
  assert!(ws.file_exists("dist/artifacts/gateway/gateway-win.zip"));
  assert!(!ws.file_exists(".fleet-rail/staging/ood-daemon"));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("legacy (not publishable)"));
  Ok(())
}

#[test]
fn test_publish_services_and_tools() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.publish("linux;win", "services;tools", "beta", "7")?;
  assert_success(&output);

  let manifest = ws.read_json("dist/manifest.json")?;
  let entries = manifest.as_array().expect("manifest is an array");
  let ids: Vec<&str> = entries.iter().filter_map(|e| e["id"].as_str()).collect();
  assert_eq!(ids, vec!["svc-ood", "svc-gateway", "tool-repo"]);
  assert!(entries.iter().all(|e| e["version"] == "1.1.1.7"));

  let calls = ws.calls();
  assert!(calls.contains(&"pack repo-tool linux".to_string()));
  assert!(!calls.contains(&"pack repo-tool win".to_string()));
  Ok(())
}

#[test]
fn test_unknown_channel_exits_before_any_work() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.publish("linux", "services", "foo", "42")?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("foo"));

  assert!(ws.calls().is_empty());
  assert!(!ws.file_exists(".fleet-rail"));
  assert!(!ws.file_exists("dist"));
  Ok(())
}

#[test]
fn test_non_numeric_build_exits_1() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = ws.publish("linux", "services", "stable", "next")?;
  assert_eq!(output.status.code(), Some(1));
  assert!(ws.calls().is_empty());
  Ok(())
}

#[test]
fn test_missing_registry_id_fails_fast() -> Result<()> {
  let ws = TestWorkspace::with_fleet(
    r#"
[[services]]
name = "ood-daemon"
id = "svc-ood"
configs = { default = "cfg/ood.cfg" }

[[services]]
name = "gateway"
configs = { default = "cfg/gateway.cfg" }
"#,
  )?;

  let output = ws.publish("linux", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("gateway"));

  assert!(ws.calls().is_empty(), "no stage ran for the valid service either");
  assert!(!ws.file_exists(".fleet-rail/steps.json"));
  assert!(!ws.file_exists("dist/manifest.json"));
  Ok(())
}

#[test]
fn test_low_balance_blocks_publish() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.set_balance(10)?;

  let output = ws.publish("linux;win", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("acc-pub"));

  assert!(ws.calls().is_empty());
  assert!(!ws.file_exists(".fleet-rail/steps.json"));
  assert!(!ws.file_exists("dist/manifest.json"));
  Ok(())
}

#[test]
fn test_missing_environment_exits_1() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_fleet_rail(
    &ws.path,
    &["linux", "services", "nightly", "42"],
    &[("FLEET_NOTIFY_TOKEN", "test-token")],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("FLEET_DESC_PATH"));
  assert!(ws.calls().is_empty());
  Ok(())
}

#[test]
fn test_pack_failure_exits_2() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.fail("pack", "ood-daemon")?;

  let output = ws.publish("linux", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(2));
  assert_eq!(ws.calls(), vec!["pack ood-daemon linux"]);
  assert!(!ws.file_exists("dist/manifest.json"));
  Ok(())
}

#[test]
fn test_config_in_subdirectory() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let nested = ws.path.join("deploy");
  std::fs::create_dir_all(&nested)?;

  let output = run_fleet_rail(
    &nested,
    &["linux", "services", "nightly", "1", "--config", "../fleet.toml"],
    &[("FLEET_DESC_PATH", "../keys/pub.desc"), ("FLEET_NOTIFY_TOKEN", "test-token")],
  )?;
  assert_success(&output);
  assert!(ws.file_exists("dist/manifest.json"));
  Ok(())
}

//! Integration tests for resuming an interrupted publish run

use crate::helpers::{TestWorkspace, assert_success};
use anyhow::Result;

#[test]
fn test_resume_after_upload_failure() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.fail("upload", "gateway")?;

  let output = ws.publish("linux;win", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(2));
  assert!(!ws.file_exists("dist/manifest.json"), "no partial manifest");

  let steps = ws.read_json(".fleet-rail/steps.json")?;
  assert_eq!(steps["ood-daemon"]["stage"], 3);
  assert_eq!(steps["ood-daemon"]["arg"], "1.1.0.42");
  assert_eq!(steps["gateway"]["stage"], 1);

  ws.clear_failures()?;
  ws.reset_calls()?;

  let output = ws.publish("linux;win", "services", "nightly", "42")?;
  assert_success(&output);

  assert_eq!(
    ws.calls(),
    vec!["upload gateway", "set_version svc-gateway fid-gateway 1.1.0.42"],
    "completed stages are never repeated"
  );
  assert!(!ws.file_exists(".fleet-rail/steps.json"));

  let manifest = ws.read_json("dist/manifest.json")?;
  assert_eq!(manifest.as_array().map(Vec::len), Some(2));
  Ok(())
}

#[test]
fn test_resume_uses_recorded_fid() -> Result<()> {
  let ws = TestWorkspace::with_fleet(
    r#"
[[services]]
name = "ood-daemon"
id = "svc-ood"
configs = { default = "cfg/ood.cfg" }
"#,
  )?;
  std::fs::create_dir_all(ws.path.join(".fleet-rail"))?;
  std::fs::write(
    ws.path.join(".fleet-rail/steps.json"),
    r#"{ "ood-daemon": { "stage": 2, "arg": "abc123", "recorded_at": "2026-01-01T00:00:00Z" } }"#,
  )?;

  let output = ws.publish("linux", "services", "nightly", "42")?;
  assert_success(&output);

  assert_eq!(ws.calls(), vec!["set_version svc-ood abc123 1.1.0.42"]);
  assert_eq!(
    ws.read_json("dist/manifest.json")?,
    serde_json::json!([{ "id": "svc-ood", "version": "1.1.0.42", "status": "active" }])
  );
  Ok(())
}

#[test]
fn test_resume_still_checks_balance() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.fail("upload", "ood-daemon")?;
  assert_eq!(ws.publish("linux", "services", "nightly", "42")?.status.code(), Some(2));

  ws.clear_failures()?;
  ws.reset_calls()?;
  ws.set_balance(0)?;

  let output = ws.publish("linux", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(3));
  assert!(ws.calls().is_empty());

  let steps = ws.read_json(".fleet-rail/steps.json")?;
  assert_eq!(steps["ood-daemon"]["stage"], 1, "record untouched by a blocked run");
  Ok(())
}

#[test]
fn test_corrupt_step_table_exits_4() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::create_dir_all(ws.path.join(".fleet-rail"))?;
  std::fs::write(ws.path.join(".fleet-rail/steps.json"), "{ not json")?;

  let output = ws.publish("linux", "services", "nightly", "42")?;
  assert_eq!(output.status.code(), Some(4));
  assert!(ws.calls().is_empty());
  Ok(())
}

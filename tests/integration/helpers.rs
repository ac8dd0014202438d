//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Every external tool call is appended to this file by the fake scripts
pub const CALL_LOG: &str = "calls.log";

const PACK_SH: &str = r#"#!/bin/sh
echo "pack $1 $2" >> calls.log
if [ ! -d "$3" ]; then echo "missing staging $3" >&2; exit 1; fi
if [ -f "fail/pack-$1" ]; then echo "pack refused" >&2; exit 1; fi
printf 'zip %s %s\n' "$1" "$2" > "$4"
"#;

const UPLOAD_SH: &str = r#"#!/bin/sh
echo "upload $1" >> calls.log
if [ -f "fail/upload-$1" ]; then echo "upload refused" >&2; exit 1; fi
echo "uploading $2 with $3"
echo "fid-$1"
"#;

const SET_VERSION_SH: &str = r#"#!/bin/sh
echo "set_version $3 $1 $2" >> calls.log
"#;

const ACCOUNT_SH: &str = r#"#!/bin/sh
echo "acc-$(basename "$1" .desc)"
"#;

const BALANCE_SH: &str = r#"#!/bin/sh
amount=$(cat balance 2>/dev/null || echo 5000000000)
for id in $(echo "$1" | tr ';' ' '); do
  echo "$amount"
done
"#;

const COMMANDS: &str = r#"
[commands.pack]
program = "sh"
args = ["bin/pack.sh", "{service}", "{target}", "{staging}", "{archive}"]

[commands.upload]
program = "sh"
args = ["bin/upload.sh", "{service}", "{path}", "{desc}"]

[commands.set_version]
program = "sh"
args = ["bin/set_version.sh", "{fid}", "{version}", "{id}"]

[commands.account_id]
program = "sh"
args = ["bin/account.sh", "{desc}"]

[commands.balance]
program = "sh"
args = ["bin/balance.sh", "{ids}"]
"#;

/// Two services, one non-publishable service and one tool
pub const DEFAULT_FLEET: &str = r#"
[[services]]
name = "ood-daemon"
id = "svc-ood"
configs = { default = "cfg/ood.cfg" }
assets = { default = ["assets/lang"] }

[[services]]
name = "gateway"
id = "svc-gateway"
configs = { default = "cfg/gateway.cfg", win = "cfg/gateway-win.cfg" }

[[services]]
name = "legacy"
publish = false

[[tools]]
name = "repo-tool"
id = "tool-repo"
configs = { default = "cfg/repo-tool.cfg" }
include = ["linux"]
"#;

/// A throwaway workspace with fake external tools and a fleet.toml
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace using [`DEFAULT_FLEET`]
  pub fn new() -> Result<Self> {
    Self::with_fleet(DEFAULT_FLEET)
  }

  /// Create a workspace whose fleet.toml declares `descriptors`
  pub fn with_fleet(descriptors: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    for dir in ["bin", "cfg", "assets/lang", "keys", "fail"] {
      std::fs::create_dir_all(path.join(dir))?;
    }

    for (name, script) in [
      ("pack.sh", PACK_SH),
      ("upload.sh", UPLOAD_SH),
      ("set_version.sh", SET_VERSION_SH),
      ("account.sh", ACCOUNT_SH),
      ("balance.sh", BALANCE_SH),
    ] {
      std::fs::write(path.join("bin").join(name), script)?;
    }

    for cfg in ["ood", "gateway", "gateway-win", "repo-tool"] {
      std::fs::write(path.join("cfg").join(format!("{}.cfg", cfg)), format!("config {}\n", cfg))?;
    }
    std::fs::write(path.join("assets/lang/en.json"), "{}")?;
    std::fs::write(path.join("keys/pub.desc"), "publisher")?;

    std::fs::write(path.join("fleet.toml"), format!("{}\n{}", COMMANDS, descriptors))?;

    Ok(Self { _root: root, path })
  }

  /// Make the fake `tool` fail for `service` until [`Self::clear_failures`]
  pub fn fail(&self, tool: &str, service: &str) -> Result<()> {
    std::fs::write(self.path.join("fail").join(format!("{}-{}", tool, service)), "")?;
    Ok(())
  }

  pub fn clear_failures(&self) -> Result<()> {
    std::fs::remove_dir_all(self.path.join("fail"))?;
    std::fs::create_dir_all(self.path.join("fail"))?;
    Ok(())
  }

  /// Balance reported by the fake ledger for every account
  pub fn set_balance(&self, amount: u64) -> Result<()> {
    std::fs::write(self.path.join("balance"), amount.to_string())?;
    Ok(())
  }

  /// External calls made so far, in order
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.path.join(CALL_LOG))
      .map(|log| log.lines().map(String::from).collect())
      .unwrap_or_default()
  }

  pub fn reset_calls(&self) -> Result<()> {
    if self.file_exists(CALL_LOG) {
      std::fs::remove_file(self.path.join(CALL_LOG))?;
    }
    Ok(())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Read and parse a JSON file
  pub fn read_json(&self, path: &str) -> Result<serde_json::Value> {
    let content = self.read_file(path)?;
    serde_json::from_str(&content).with_context(|| format!("{} is not JSON", path))
  }

  /// Run `fleet-rail <targets> <types> <channel> <build>` with the default environment
  pub fn publish(&self, targets: &str, types: &str, channel: &str, build: &str) -> Result<Output> {
    run_fleet_rail(&self.path, &[targets, types, channel, build], &default_env())
  }
}

/// Environment of a run with both accounts on the same descriptor
pub fn default_env() -> Vec<(&'static str, &'static str)> {
  vec![("FLEET_DESC_PATH", "keys/pub.desc"), ("FLEET_NOTIFY_TOKEN", "test-token")]
}

/// Run the fleet-rail binary; the caller inspects the exit status
pub fn run_fleet_rail(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let fleet_rail_bin = env!("CARGO_BIN_EXE_fleet-rail");

  let output = Command::new(fleet_rail_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("FLEET_DESC_PATH")
    .env_remove("FLEET_FILE_DESC_PATH")
    .env_remove("FLEET_NOTIFY_TOKEN")
    .env_remove("RUST_LOG")
    .envs(env.iter().copied())
    .output()
    .context("Failed to run fleet-rail")?;

  Ok(output)
}

/// Fail with both output streams unless the run succeeded
pub fn assert_success(output: &Output) {
  assert!(
    output.status.success(),
    "fleet-rail failed ({})\nstdout: {}\nstderr: {}",
    output.status,
    String::from_utf8_lossy(&output.stdout),
    String::from_utf8_lossy(&output.stderr)
  );
}

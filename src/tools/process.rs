//! Process-backed collaborators driven by fleet.toml command templates

use crate::core::config::{CommandTemplate, CommandsConfig};
use crate::core::error::{ExternalError, RailResult};
use crate::tools::command::ToolCommand;
use crate::tools::{Packager, Registrar, Uploader};
use std::path::{Path, PathBuf};

/// Runs `commands.pack` once per (service, target)
pub struct ProcessPackager {
  template: CommandTemplate,
  cwd: PathBuf,
}

impl ProcessPackager {
  pub fn new(commands: &CommandsConfig, cwd: &Path) -> Self {
    Self {
      template: commands.pack.clone(),
      cwd: cwd.to_path_buf(),
    }
  }
}

impl Packager for ProcessPackager {
  fn pack(&self, service: &str, target: &str, staging: &Path, archive: &Path) -> RailResult<()> {
    let staging = staging.display().to_string();
    let archive = archive.display().to_string();
    ToolCommand::new("pack", &self.template, &self.cwd).run(&[
      ("service", service),
      ("target", target),
      ("staging", &staging),
      ("archive", &archive),
    ])?;
    Ok(())
  }
}

/// Runs `commands.upload` with the file-distribution account
pub struct ProcessUploader {
  template: CommandTemplate,
  cwd: PathBuf,
  desc: PathBuf,
}

impl ProcessUploader {
  pub fn new(commands: &CommandsConfig, cwd: &Path, desc: &Path) -> Self {
    Self {
      template: commands.upload.clone(),
      cwd: cwd.to_path_buf(),
      desc: desc.to_path_buf(),
    }
  }
}

impl Uploader for ProcessUploader {
  fn upload(&self, service: &str, artifacts: &Path) -> RailResult<String> {
    let path = artifacts.display().to_string();
    let desc = self.desc.display().to_string();
    ToolCommand::new("upload", &self.template, &self.cwd).run_for_identifier(&[
      ("service", service),
      ("path", &path),
      ("desc", &desc),
    ])
  }
}

/// Runs the registry commands with the publishing account
pub struct ProcessRegistrar {
  set_version: CommandTemplate,
  account_id: CommandTemplate,
  balance: CommandTemplate,
  cwd: PathBuf,
  desc: PathBuf,
}

impl ProcessRegistrar {
  pub fn new(commands: &CommandsConfig, cwd: &Path, desc: &Path) -> Self {
    Self {
      set_version: commands.set_version.clone(),
      account_id: commands.account_id.clone(),
      balance: commands.balance.clone(),
      cwd: cwd.to_path_buf(),
      desc: desc.to_path_buf(),
    }
  }
}

impl Registrar for ProcessRegistrar {
  fn set_version(&self, fid: &str, version: &str, id: &str) -> RailResult<()> {
    let desc = self.desc.display().to_string();
    ToolCommand::new("set-version", &self.set_version, &self.cwd).run(&[
      ("fid", fid),
      ("version", version),
      ("id", id),
      ("desc", &desc),
    ])?;
    Ok(())
  }

  fn account_id(&self, desc: &Path) -> RailResult<String> {
    let desc = desc.display().to_string();
    ToolCommand::new("account-id", &self.account_id, &self.cwd).run_for_identifier(&[("desc", &desc)])
  }

  fn balances(&self, ids: &[String]) -> RailResult<Vec<u64>> {
    let joined = ids.join(";");
    let stdout = ToolCommand::new("balance", &self.balance, &self.cwd).run(&[("ids", &joined)])?;
    parse_balances(&stdout, ids.len())
  }
}

/// One integer per queried id, whitespace separated, in query order
fn parse_balances(stdout: &str, expected: usize) -> RailResult<Vec<u64>> {
  let balances = stdout
    .split_whitespace()
    .map(|token| {
      token.parse::<u64>().map_err(|_| ExternalError::BadOutput {
        tool: "balance".to_string(),
        reason: format!("'{}' is not a balance", token),
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  if balances.len() != expected {
    return Err(
      ExternalError::BadOutput {
        tool: "balance".to_string(),
        reason: format!("expected {} balances, got {}", expected, balances.len()),
      }
      .into(),
    );
  }
  Ok(balances)
}

//! Rendering and running external command templates
//!
//! Arguments may contain `{name}` placeholders that are substituted before the
//! program is spawned. The program runs in the workspace root with stdout and
//! stderr captured; a non-zero exit is an [`ExternalError::Failed`].

use crate::core::config::CommandTemplate;
use crate::core::error::{ExternalError, RailResult};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// A command template bound to a tool name and working directory
pub struct ToolCommand<'a> {
  name: &'static str,
  template: &'a CommandTemplate,
  cwd: &'a Path,
}

impl<'a> ToolCommand<'a> {
  pub fn new(name: &'static str, template: &'a CommandTemplate, cwd: &'a Path) -> Self {
    Self { name, template, cwd }
  }

  /// Render the argument list for `vars`
  pub fn render_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
    self.template.args.iter().map(|arg| render(arg, vars)).collect()
  }

  /// Run to completion and return stdout
  pub fn run(&self, vars: &[(&str, &str)]) -> RailResult<String> {
    let args = self.render_args(vars);
    debug!(tool = self.name, program = %self.template.program, args = ?args, "running external tool");

    let output = Command::new(&self.template.program)
      .current_dir(self.cwd)
      .args(&args)
      .output()
      .map_err(|e| ExternalError::Spawn {
        tool: self.name.to_string(),
        reason: format!("{}: {}", self.template.program, e),
      })?;

    if !output.status.success() {
      return Err(
        ExternalError::Failed {
          tool: self.name.to_string(),
          status: output.status.to_string(),
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into(),
      );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  /// Run and return the identifier printed on the last non-empty stdout line
  pub fn run_for_identifier(&self, vars: &[(&str, &str)]) -> RailResult<String> {
    let stdout = self.run(vars)?;
    last_line(&stdout).ok_or_else(|| {
      ExternalError::BadOutput {
        tool: self.name.to_string(),
        reason: "no identifier on stdout".to_string(),
      }
      .into()
    })
  }
}

/// Substitute every `{key}` in `arg`
pub fn render(arg: &str, vars: &[(&str, &str)]) -> String {
  let mut out = arg.to_string();
  for (key, value) in vars {
    out = out.replace(&format!("{{{}}}", key), value);
  }
  out
}

/// Last non-empty trimmed line
pub fn last_line(output: &str) -> Option<String> {
  output
    .lines()
    .map(str::trim)
    .rev()
    .find(|line| !line.is_empty())
    .map(String::from)
}

//! Process environment required by a release run
//!
//! Read once in `main` and passed down, so nothing below the entry point
//! touches the ambient environment.

use crate::core::error::{ConfigError, RailError, RailResult};
use std::path::PathBuf;
use tracing::warn;

pub const DESC_PATH_VAR: &str = "FLEET_DESC_PATH";
pub const FILE_DESC_PATH_VAR: &str = "FLEET_FILE_DESC_PATH";
pub const NOTIFY_TOKEN_VAR: &str = "FLEET_NOTIFY_TOKEN";

/// Credentials and tokens for one run
#[derive(Debug, Clone)]
pub struct ReleaseEnv {
  /// Descriptor of the binary-distribution (publishing) account
  pub desc_path: PathBuf,
  /// Descriptor of the file-distribution account
  pub file_desc_path: PathBuf,
  /// Access token of the notification channel
  pub notify_token: String,
}

impl ReleaseEnv {
  /// Read from the process environment
  pub fn from_env() -> RailResult<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Read through an arbitrary lookup function
  pub fn from_lookup<F>(lookup: F) -> RailResult<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let desc_path = get(DESC_PATH_VAR).map(PathBuf::from).ok_or_else(|| missing(DESC_PATH_VAR))?;

    let file_desc_path = match get(FILE_DESC_PATH_VAR) {
      Some(path) => PathBuf::from(path),
      None => {
        warn!(
          "{} not set, file distribution uses the publishing account {}",
          FILE_DESC_PATH_VAR,
          desc_path.display()
        );
        desc_path.clone()
      }
    };

    let notify_token = get(NOTIFY_TOKEN_VAR).ok_or_else(|| missing(NOTIFY_TOKEN_VAR))?;

    Ok(Self {
      desc_path,
      file_desc_path,
      notify_token,
    })
  }
}

fn missing(var: &str) -> RailError {
  RailError::Config(ConfigError::MissingEnv { var: var.to_string() })
}

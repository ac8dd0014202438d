//! Per-service release stages
//!
//! A service moves through Pack → Upload → SetVersion → Finish. Each kind has
//! an increasing ordinal so "has this stage completed" is an integer
//! comparison. [`Stage`] is what a step record holds: the furthest completed
//! stage together with the argument that stage produced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage kinds in strict forward order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
  Pack,
  Upload,
  SetVersion,
  Finish,
}

impl StageKind {
  pub fn ordinal(self) -> u8 {
    match self {
      StageKind::Pack => 1,
      StageKind::Upload => 2,
      StageKind::SetVersion => 3,
      StageKind::Finish => 4,
    }
  }

  pub fn from_ordinal(ordinal: u8) -> Option<Self> {
    match ordinal {
      1 => Some(StageKind::Pack),
      2 => Some(StageKind::Upload),
      3 => Some(StageKind::SetVersion),
      4 => Some(StageKind::Finish),
      _ => None,
    }
  }
}

impl fmt::Display for StageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StageKind::Pack => write!(f, "pack"),
      StageKind::Upload => write!(f, "upload"),
      StageKind::SetVersion => write!(f, "set-version"),
      StageKind::Finish => write!(f, "finish"),
    }
  }
}

/// A completed stage and its carried argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStage", into = "RawStage")]
pub enum Stage {
  /// Every target archived
  Pack,
  /// Artifact tree uploaded; carries the content identifier
  Upload { fid: String },
  /// Version record committed; carries the registered version
  SetVersion { version: String },
}

impl Stage {
  pub fn kind(&self) -> StageKind {
    match self {
      Stage::Pack => StageKind::Pack,
      Stage::Upload { .. } => StageKind::Upload,
      Stage::SetVersion { .. } => StageKind::SetVersion,
    }
  }

  pub fn ordinal(&self) -> u8 {
    self.kind().ordinal()
  }

  fn arg(&self) -> Option<&str> {
    match self {
      Stage::Pack => None,
      Stage::Upload { fid } => Some(fid),
      Stage::SetVersion { version } => Some(version),
    }
  }
}

/// On-disk shape: ordinal plus opaque argument
#[derive(Serialize, Deserialize)]
struct RawStage {
  stage: u8,
  #[serde(default)]
  arg: Option<String>,
}

impl TryFrom<RawStage> for Stage {
  type Error = String;

  fn try_from(raw: RawStage) -> Result<Self, Self::Error> {
    let kind = StageKind::from_ordinal(raw.stage).ok_or_else(|| format!("unknown stage ordinal {}", raw.stage))?;
    let arg = raw.arg.filter(|a| !a.is_empty());
    match (kind, arg) {
      (StageKind::Pack, _) => Ok(Stage::Pack),
      (StageKind::Upload, Some(fid)) => Ok(Stage::Upload { fid }),
      (StageKind::SetVersion, Some(version)) => Ok(Stage::SetVersion { version }),
      (StageKind::Finish, _) => Err("finish is never recorded".to_string()),
      (kind, None) => Err(format!("{} record without its argument", kind)),
    }
  }
}

impl From<Stage> for RawStage {
  fn from(stage: Stage) -> Self {
    RawStage {
      stage: stage.ordinal(),
      arg: stage.arg().map(String::from),
    }
  }
}

//! Release channels and the run version string

use crate::core::error::{ConfigError, RailError, RailResult};
use std::fmt;
use std::str::FromStr;

pub const VERSION_MAJOR: u32 = 1;
pub const VERSION_MINOR: u32 = 1;

/// Named release lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
  Nightly,
  Beta,
  Stable,
}

impl Channel {
  /// Numeric version component of this channel
  pub fn code(self) -> u32 {
    match self {
      Channel::Nightly => 0,
      Channel::Beta => 1,
      Channel::Stable => 2,
    }
  }
}

impl FromStr for Channel {
  type Err = RailError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "nightly" => Ok(Channel::Nightly),
      "beta" => Ok(Channel::Beta),
      "stable" => Ok(Channel::Stable),
      other => Err(RailError::Config(ConfigError::UnknownChannel { name: other.to_string() })),
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Channel::Nightly => write!(f, "nightly"),
      Channel::Beta => write!(f, "beta"),
      Channel::Stable => write!(f, "stable"),
    }
  }
}

/// One invocation of the release pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRun {
  pub channel: Channel,
  pub build: u64,
}

impl ReleaseRun {
  /// Build a run from the raw channel and build-number arguments
  ///
  /// The build number is plain ASCII digits, read as an integer: `042` and
  /// `42` name the same build.
  pub fn parse(channel: &str, build: &str) -> RailResult<Self> {
    let channel: Channel = channel.trim().parse()?;
    let invalid = || {
      RailError::Config(ConfigError::InvalidBuildNumber {
        value: build.to_string(),
      })
    };
    let digits = build.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let build = digits.parse::<u64>().map_err(|_| invalid())?;
    Ok(Self { channel, build })
  }

  /// `major.minor.<channel-code>.<build>`
  pub fn version(&self) -> String {
    format!(
      "{}.{}.{}.{}",
      VERSION_MAJOR,
      VERSION_MINOR,
      self.channel.code(),
      self.build
    )
  }
}

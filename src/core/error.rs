//! Error types for fleet-rail with contextual messages and exit codes
//!
//! Every failure of a release run lands in one of the categories below. The
//! category decides the process exit code; the top level prints the error with
//! an optional help line and exits.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for fleet-rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Configuration error (bad args, missing registry id, missing env)
  Config = 1,
  /// External call or I/O failure (packer, uploader, registry)
  External = 2,
  /// Precondition failure (account balance below threshold)
  Precondition = 3,
  /// Internal-consistency failure (broken state machine invariant)
  Consistency = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for fleet-rail
#[derive(Debug)]
pub enum RailError {
  /// Configuration errors, detected before any stage runs
  Config(ConfigError),

  /// Balance guard rejected the run
  Precondition(PreconditionError),

  /// An external tool or service failed
  External(ExternalError),

  /// The release state machine found its own invariants broken
  Consistency { message: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Create an internal-consistency error
  pub fn consistency(msg: impl Into<String>) -> Self {
    RailError::Consistency { message: msg.into() }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(err) => RailError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::Config,
      RailError::Precondition(_) => ExitCode::Precondition,
      RailError::External(_) => ExitCode::External,
      RailError::Consistency { .. } => ExitCode::Consistency,
      RailError::Io(_) => ExitCode::External,
      RailError::Message { .. } => ExitCode::External,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Precondition(e) => e.help_message(),
      RailError::External(_) => {
        Some("Fix the failing tool and re-run the same command; completed stages are skipped.".to_string())
      }
      RailError::Consistency { .. } => Some(format!(
        "Inspect or remove the step table ({}) before re-running.",
        super::config::DEFAULT_STEPS_PATH
      )),
      RailError::Message { help, .. } => help.clone(),
      RailError::Io(_) => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Precondition(e) => write!(f, "{}", e),
      RailError::External(e) => write!(f, "{}", e),
      RailError::Consistency { message } => write!(f, "Internal consistency error: {}", message),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<ConfigError> for RailError {
  fn from(err: ConfigError) -> Self {
    RailError::Config(err)
  }
}

impl From<ExternalError> for RailError {
  fn from(err: ExternalError) -> Self {
    RailError::External(err)
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::Config(ConfigError::Invalid {
      reason: format!("TOML deserialization error: {}", err),
    })
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<tempfile::PersistError> for RailError {
  fn from(err: tempfile::PersistError) -> Self {
    RailError::Io(err.error)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// fleet.toml not found
  NotFound { path: PathBuf },

  /// Channel name outside the known set
  UnknownChannel { name: String },

  /// Publish kind outside the known set
  UnknownPublishKind { name: String },

  /// Build number is not a non-negative integer
  InvalidBuildNumber { value: String },

  /// Required environment variable is not set
  MissingEnv { var: String },

  /// Publishable service without a registry id
  MissingRegistryId { service: String },

  /// Publishable service without a `default` packaging config
  MissingDefaultConfig { service: String },

  /// Include/exclude filters leave no target for a publishable service
  NoApplicableTargets { service: String },

  /// Two descriptors share one name
  DuplicateService { name: String },

  /// Any other malformed configuration
  Invalid { reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Pass --config <path> or create fleet.toml in the working directory.".to_string()),
      ConfigError::UnknownChannel { .. } => Some("Known channels: nightly, beta, stable.".to_string()),
      ConfigError::UnknownPublishKind { .. } => Some("Known publish types: services, tools.".to_string()),
      ConfigError::MissingEnv { var } => Some(format!("Export {} before running a release.", var)),
      ConfigError::MissingRegistryId { service } => Some(format!(
        "Add `id = \"...\"` to the descriptor of '{}' or set `publish = false`.",
        service
      )),
      ConfigError::MissingDefaultConfig { service } => Some(format!(
        "Add a `default` entry under `configs` for '{}'.",
        service
      )),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Fleet configuration not found: {}", path.display()),
      ConfigError::UnknownChannel { name } => write!(f, "Unknown release channel '{}'", name),
      ConfigError::UnknownPublishKind { name } => write!(f, "Unknown publish type '{}'", name),
      ConfigError::InvalidBuildNumber { value } => write!(f, "Invalid build number '{}'", value),
      ConfigError::MissingEnv { var } => write!(f, "Missing required environment variable {}", var),
      ConfigError::MissingRegistryId { service } => write!(f, "Service '{}' has no registry id", service),
      ConfigError::MissingDefaultConfig { service } => {
        write!(f, "Service '{}' has no default packaging config", service)
      }
      ConfigError::NoApplicableTargets { service } => {
        write!(f, "Service '{}' has no applicable target for this run", service)
      }
      ConfigError::DuplicateService { name } => write!(f, "Service '{}' is declared more than once", name),
      ConfigError::Invalid { reason } => write!(f, "Invalid configuration: {}", reason),
    }
  }
}

/// Balance guard failures
#[derive(Debug)]
pub enum PreconditionError {
  /// One or more accounts below the minimum balance
  InsufficientBalance {
    channel: String,
    accounts: Vec<(String, u64)>,
    minimum: u64,
  },
}

impl PreconditionError {
  fn help_message(&self) -> Option<String> {
    match self {
      PreconditionError::InsufficientBalance { minimum, .. } => {
        Some(format!("Top up the listed accounts to at least {} and re-run.", minimum))
      }
    }
  }
}

impl fmt::Display for PreconditionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionError::InsufficientBalance {
        channel,
        accounts,
        minimum,
      } => {
        let listed: Vec<String> = accounts.iter().map(|(id, b)| format!("{} ({})", id, b)).collect();
        write!(
          f,
          "Insufficient balance on {} channel, minimum {}: {}",
          channel,
          minimum,
          listed.join(", ")
        )
      }
    }
  }
}

/// External tool failures
#[derive(Debug)]
pub enum ExternalError {
  /// Tool could not be spawned
  Spawn { tool: String, reason: String },

  /// Tool exited non-zero
  Failed { tool: String, status: String, stderr: String },

  /// Tool succeeded but its output could not be used
  BadOutput { tool: String, reason: String },
}

impl fmt::Display for ExternalError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExternalError::Spawn { tool, reason } => write!(f, "Failed to run {}: {}", tool, reason),
      ExternalError::Failed { tool, status, stderr } => {
        write!(f, "{} failed ({})", tool, status)?;
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      ExternalError::BadOutput { tool, reason } => write!(f, "Unusable output from {}: {}", tool, reason),
    }
  }
}

/// Result type alias for fleet-rail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

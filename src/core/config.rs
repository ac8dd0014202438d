use crate::core::error::{ConfigError, RailError, RailResult, ResultExt};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "fleet.toml";
pub const DEFAULT_STAGING_PATH: &str = ".fleet-rail/staging";
pub const DEFAULT_ARTIFACTS_PATH: &str = "dist/artifacts";
pub const DEFAULT_STEPS_PATH: &str = ".fleet-rail/steps.json";
pub const DEFAULT_MANIFEST_PATH: &str = "dist/manifest.json";
pub const DEFAULT_MIN_BALANCE: u64 = 1_000_000_000;

/// Key of the fallback entry in `configs` and `assets`
pub const DEFAULT_TARGET_KEY: &str = "default";

/// Fleet configuration, loaded from fleet.toml
///
/// # Example
///
/// ```toml
/// [paths]
/// manifest = "dist/manifest.json"
///
/// [guard]
/// min_balance = 1000000000
///
/// [notify]
/// url = "https://oapi.example.com/robot/send"
///
/// [commands.pack]
/// program = "pack-tool"
/// args = ["--service", "{service}", "--target", "{target}", "--out", "{archive}", "{staging}"]
///
/// [[services]]
/// name = "ood-daemon"
/// id = "9tGpLNnDpa8deXEk2NaWGccEu4yFQ2DrTZJPLYLT7gj4"
/// configs = { default = "services/ood-daemon/package.cfg" }
/// exclude = ["aarch64-apple-darwin"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub guard: GuardConfig,
  #[serde(default)]
  pub notify: NotifyConfig,
  pub commands: CommandsConfig,
  #[serde(default)]
  pub services: Vec<ServiceDescriptor>,
  #[serde(default)]
  pub tools: Vec<ServiceDescriptor>,
}

/// Working locations, relative to the workspace root
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
  #[serde(default = "default_staging")]
  pub staging: PathBuf,
  #[serde(default = "default_artifacts")]
  pub artifacts: PathBuf,
  #[serde(default = "default_steps")]
  pub steps: PathBuf,
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,
}

fn default_staging() -> PathBuf {
  PathBuf::from(DEFAULT_STAGING_PATH)
}

fn default_artifacts() -> PathBuf {
  PathBuf::from(DEFAULT_ARTIFACTS_PATH)
}

fn default_steps() -> PathBuf {
  PathBuf::from(DEFAULT_STEPS_PATH)
}

fn default_manifest() -> PathBuf {
  PathBuf::from(DEFAULT_MANIFEST_PATH)
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      staging: default_staging(),
      artifacts: default_artifacts(),
      steps: default_steps(),
      manifest: default_manifest(),
    }
  }
}

impl PathsConfig {
  /// Anchor every path at `root`
  pub fn resolve(&self, root: &Path) -> ReleasePaths {
    ReleasePaths {
      root: root.to_path_buf(),
      staging: root.join(&self.staging),
      artifacts: root.join(&self.artifacts),
      steps: root.join(&self.steps),
      manifest: root.join(&self.manifest),
    }
  }
}

/// Absolute working locations for one run
#[derive(Debug, Clone)]
pub struct ReleasePaths {
  pub root: PathBuf,
  pub staging: PathBuf,
  pub artifacts: PathBuf,
  pub steps: PathBuf,
  pub manifest: PathBuf,
}

/// Balance guard settings
#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
  #[serde(default = "default_min_balance")]
  pub min_balance: u64,
}

fn default_min_balance() -> u64 {
  DEFAULT_MIN_BALANCE
}

impl Default for GuardConfig {
  fn default() -> Self {
    Self {
      min_balance: DEFAULT_MIN_BALANCE,
    }
  }
}

/// Notification webhook settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
  /// Webhook endpoint; notifications are dropped when unset
  #[serde(default)]
  pub url: Option<String>,
}

/// An external program plus its argument template
#[derive(Debug, Clone, Deserialize)]
pub struct CommandTemplate {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
}

/// External command templates for every collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
  pub pack: CommandTemplate,
  pub upload: CommandTemplate,
  pub set_version: CommandTemplate,
  pub account_id: CommandTemplate,
  pub balance: CommandTemplate,
}

/// Descriptor group selected by the publish-type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishKind {
  Services,
  Tools,
}

impl FromStr for PublishKind {
  type Err = RailError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "services" => Ok(PublishKind::Services),
      "tools" => Ok(PublishKind::Tools),
      other => Err(RailError::Config(ConfigError::UnknownPublishKind { name: other.to_string() })),
    }
  }
}

impl fmt::Display for PublishKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishKind::Services => write!(f, "services"),
      PublishKind::Tools => write!(f, "tools"),
    }
  }
}

/// One publishable binary of the fleet
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescriptor {
  pub name: String,

  /// Stable registry id; required when `publish` is true
  #[serde(default)]
  pub id: Option<String>,

  #[serde(default = "default_publish")]
  pub publish: bool,

  /// target → packaging config file; `default` is the fallback
  #[serde(default)]
  pub configs: BTreeMap<String, PathBuf>,

  /// target → extra files copied into the package; `default` applies to all targets
  #[serde(default)]
  pub assets: BTreeMap<String, Vec<PathBuf>>,

  #[serde(default)]
  pub include: Vec<String>,

  #[serde(default)]
  pub exclude: Vec<String>,
}

fn default_publish() -> bool {
  true
}

impl ServiceDescriptor {
  /// Registry id, treating an empty string as absent
  pub fn registry_id(&self) -> Option<&str> {
    self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
  }

  /// Run targets this service is packaged for, in run order
  pub fn applicable_targets<'a>(&self, targets: &'a [String]) -> Vec<&'a str> {
    targets
      .iter()
      .map(String::as_str)
      .filter(|t| self.include.is_empty() || self.include.iter().any(|i| i == t))
      .filter(|t| !self.exclude.iter().any(|e| e == t))
      .collect()
  }

  /// Packaging config for `target`, falling back to `default`
  pub fn config_for(&self, target: &str) -> Option<&Path> {
    self
      .configs
      .get(target)
      .or_else(|| self.configs.get(DEFAULT_TARGET_KEY))
      .map(PathBuf::as_path)
  }

  /// Asset overlays for `target`: `default` entries first, then target-specific ones
  pub fn assets_for(&self, target: &str) -> Vec<&Path> {
    let mut assets: Vec<&Path> = self
      .assets
      .get(DEFAULT_TARGET_KEY)
      .into_iter()
      .flatten()
      .map(PathBuf::as_path)
      .collect();
    if target != DEFAULT_TARGET_KEY
      && let Some(specific) = self.assets.get(target)
    {
      assets.extend(specific.iter().map(PathBuf::as_path));
    }
    assets
  }

  /// Check that a publishable descriptor can go through every stage
  pub fn validate(&self, targets: &[String]) -> RailResult<()> {
    if self.registry_id().is_none() {
      return Err(RailError::Config(ConfigError::MissingRegistryId {
        service: self.name.clone(),
      }));
    }
    if !self.configs.contains_key(DEFAULT_TARGET_KEY) {
      return Err(RailError::Config(ConfigError::MissingDefaultConfig {
        service: self.name.clone(),
      }));
    }
    if self.applicable_targets(targets).is_empty() {
      return Err(RailError::Config(ConfigError::NoApplicableTargets {
        service: self.name.clone(),
      }));
    }
    Ok(())
  }
}

/// Validate every descriptor of a run before any stage executes
///
/// Names must be unique (they key the step table). Non-publishable descriptors
/// are otherwise ignored.
pub fn validate_descriptors(descriptors: &[ServiceDescriptor], targets: &[String]) -> RailResult<()> {
  let mut seen = HashSet::new();
  for descriptor in descriptors {
    if !seen.insert(descriptor.name.as_str()) {
      return Err(RailError::Config(ConfigError::DuplicateService {
        name: descriptor.name.clone(),
      }));
    }
  }

  for descriptor in descriptors.iter().filter(|d| d.publish) {
    descriptor.validate(targets)?;
  }
  Ok(())
}

impl FleetConfig {
  /// Load config from a fleet.toml path
  pub fn load(path: &Path) -> RailResult<Self> {
    if !path.exists() {
      return Err(RailError::Config(ConfigError::NotFound {
        path: path.to_path_buf(),
      }));
    }

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
  }

  /// Parse config from TOML text
  pub fn parse(content: &str) -> RailResult<Self> {
    let config: FleetConfig = toml_edit::de::from_str(content)?;
    Ok(config)
  }

  /// Descriptors of the selected kinds, in selection order then file order
  pub fn select(&self, kinds: &[PublishKind]) -> Vec<ServiceDescriptor> {
    let mut selected = Vec::new();
    for kind in kinds {
      let group = match kind {
        PublishKind::Services => &self.services,
        PublishKind::Tools => &self.tools,
      };
      selected.extend(group.iter().cloned());
    }
    selected
  }
}

/// Split a semicolon-separated argument, dropping empty items
pub fn split_list(arg: &str) -> Vec<String> {
  arg
    .split(';')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

/// Parse the publish-type selection argument
pub fn parse_publish_kinds(arg: &str) -> RailResult<Vec<PublishKind>> {
  let mut kinds = Vec::new();
  for item in split_list(arg) {
    let kind: PublishKind = item.parse()?;
    if !kinds.contains(&kind) {
      kinds.push(kind);
    }
  }
  if kinds.is_empty() {
    return Err(RailError::Config(ConfigError::Invalid {
      reason: "no publish type selected".to_string(),
    }));
  }
  Ok(kinds)
}

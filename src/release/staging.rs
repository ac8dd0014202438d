//! Staging tree and artifact layout for the Pack stage
//!
//! ```text
//! <staging>/<service>/<target>/           config + asset overlays, removed after packing
//! <artifacts>/<service>/<service>-<target>.zip
//! ```

use crate::core::config::{ReleasePaths, ServiceDescriptor};
use crate::core::error::{ConfigError, ExternalError, RailError, RailResult, ResultExt};
use crate::utils::{copy_into, remove_dir_if_exists};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory uploaded as the service's artifact tree
pub fn artifact_dir(paths: &ReleasePaths, service: &str) -> PathBuf {
  paths.artifacts.join(service)
}

/// Deterministic archive name for (service, target)
pub fn archive_path(paths: &ReleasePaths, service: &str, target: &str) -> PathBuf {
  artifact_dir(paths, service).join(format!("{}-{}.zip", service, target))
}

pub fn staging_dir(paths: &ReleasePaths, service: &str, target: &str) -> PathBuf {
  paths.staging.join(service).join(target)
}

/// Start the service's artifact tree from scratch
pub fn reset_artifact_dir(paths: &ReleasePaths, service: &str) -> RailResult<PathBuf> {
  let dir = artifact_dir(paths, service);
  remove_dir_if_exists(&dir)?;
  fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
  Ok(dir)
}

/// Populate the staging tree of one target with its config and asset overlays
pub fn prepare_target(paths: &ReleasePaths, descriptor: &ServiceDescriptor, target: &str) -> RailResult<PathBuf> {
  let dir = staging_dir(paths, &descriptor.name, target);
  remove_dir_if_exists(&dir)?;
  fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

  let config = descriptor.config_for(target).ok_or_else(|| {
    RailError::Config(ConfigError::MissingDefaultConfig {
      service: descriptor.name.clone(),
    })
  })?;
  let config = resolve(paths, config);
  copy_into(&config, &dir).with_context(|| format!("Failed to stage config for {}/{}", descriptor.name, target))?;

  for asset in descriptor.assets_for(target) {
    let asset = resolve(paths, asset);
    copy_into(&asset, &dir).with_context(|| format!("Failed to stage asset for {}/{}", descriptor.name, target))?;
  }

  debug!(service = %descriptor.name, platform = target, staging = %dir.display(), "staged target");
  Ok(dir)
}

/// Fail unless the packager produced `archive`
pub fn ensure_archive(archive: &Path) -> RailResult<()> {
  if archive.is_file() {
    Ok(())
  } else {
    Err(RailError::External(ExternalError::BadOutput {
      tool: "pack".to_string(),
      reason: format!("archive {} was not produced", archive.display()),
    }))
  }
}

/// Remove a packed target's staging tree, and the service's once empty
pub fn clear_target(staging: &Path) -> RailResult<()> {
  remove_dir_if_exists(staging)?;
  if let Some(parent) = staging.parent()
    && fs::read_dir(parent).map(|mut it| it.next().is_none()).unwrap_or(false)
  {
    fs::remove_dir(parent).with_context(|| format!("Failed to remove {}", parent.display()))?;
  }
  Ok(())
}

fn resolve(paths: &ReleasePaths, path: &Path) -> PathBuf {
  paths.root.join(path)
}

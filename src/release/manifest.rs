//! Final per-service version list written after a successful run

use crate::core::error::{RailResult, ResultExt};
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
  Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
  /// Stable registry id of the service
  pub id: String,
  pub version: String,
  pub status: ServiceStatus,
}

/// Entries in service iteration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
  entries: Vec<ManifestEntry>,
}

impl Manifest {
  pub fn push(&mut self, entry: ManifestEntry) {
    self.entries.push(entry);
  }

  pub fn entries(&self) -> &[ManifestEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Write as a JSON array, replacing any previous manifest atomically
  pub fn write(&self, path: &Path) -> RailResult<()> {
    let json = serde_json::to_string_pretty(&self.entries)?;
    write_atomic(path, json.as_bytes()).with_context(|| format!("Failed to write manifest {}", path.display()))
  }
}

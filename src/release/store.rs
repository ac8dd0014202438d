//! Durable step table
//!
//! Maps each service name to the furthest stage it completed. The whole table
//! is loaded once per run and written back atomically after every single
//! transition, so a crash loses at most the completion of the stage that was
//! in flight.

use crate::core::error::{RailError, RailResult, ResultExt};
use crate::release::stage::{Stage, StageKind};
use crate::utils::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One service's furthest completed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
  #[serde(flatten)]
  pub stage: Stage,
  pub recorded_at: DateTime<Utc>,
}

pub struct StepStore {
  path: PathBuf,
  records: BTreeMap<String, StepRecord>,
}

impl StepStore {
  /// Load the table; a missing file is an empty table (fresh run)
  pub fn load(path: &Path) -> RailResult<Self> {
    let records = if path.exists() {
      let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read step table {}", path.display()))?;
      serde_json::from_str(&content).map_err(|e| {
        RailError::consistency(format!("step table {} cannot be decoded: {}", path.display(), e))
      })?
    } else {
      BTreeMap::new()
    };

    debug!(path = %path.display(), records = records.len(), "loaded step table");
    Ok(Self {
      path: path.to_path_buf(),
      records,
    })
  }

  /// True iff `service` has not yet completed `stage`
  pub fn need(&self, service: &str, stage: StageKind) -> bool {
    match self.records.get(service) {
      None => true,
      Some(record) => record.stage.ordinal() < stage.ordinal(),
    }
  }

  /// First stage `service` still has to run
  pub fn next_stage(&self, service: &str) -> StageKind {
    [StageKind::Pack, StageKind::Upload, StageKind::SetVersion]
      .into_iter()
      .find(|kind| self.need(service, *kind))
      .unwrap_or(StageKind::Finish)
  }

  pub fn get(&self, service: &str) -> Option<&Stage> {
    self.records.get(service).map(|r| &r.stage)
  }

  /// Record a completed stage and persist the whole table before returning
  ///
  /// Refuses to move a service backwards.
  pub fn record(&mut self, service: &str, stage: Stage) -> RailResult<()> {
    if let Some(existing) = self.records.get(service)
      && existing.stage.ordinal() > stage.ordinal()
    {
      return Err(RailError::consistency(format!(
        "refusing to move '{}' back from {} to {}",
        service,
        existing.stage.kind(),
        stage.kind()
      )));
    }

    debug!(service, stage = %stage.kind(), "recording step");
    let previous = self.records.insert(
      service.to_string(),
      StepRecord {
        stage,
        recorded_at: Utc::now(),
      },
    );

    // keep memory in line with disk when the write fails
    if let Err(e) = self.save() {
      match previous {
        Some(record) => self.records.insert(service.to_string(), record),
        None => self.records.remove(service),
      };
      return Err(e);
    }
    Ok(())
  }

  /// Write the whole table to disk
  pub fn save(&self) -> RailResult<()> {
    let json = serde_json::to_string_pretty(&self.records)?;
    write_atomic(&self.path, json.as_bytes())
  }

  /// Delete the table from disk once the run completed
  pub fn remove(self) -> RailResult<()> {
    if self.path.exists() {
      fs::remove_file(&self.path).with_context(|| format!("Failed to remove step table {}", self.path.display()))?;
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

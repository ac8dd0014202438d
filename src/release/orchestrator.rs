//! Release orchestrator: drives every service through its stages
//!
//! # Run sequence
//!
//! 1. Validate every descriptor (fail fast, nothing written)
//! 2. Balance guard
//! 3. Load the step table
//! 4. For each publishable service, in descriptor order:
//!    Pack → Upload → SetVersion → Finish, skipping every stage the table
//!    already records and persisting the table after each transition
//! 5. Write the manifest, delete the step table, notify
//!
//! Any failure stops the run. The table keeps each service at its last
//! completed stage, so re-running the same command resumes from there.

use crate::core::config::{ReleasePaths, ServiceDescriptor, validate_descriptors};
use crate::core::env::ReleaseEnv;
use crate::core::error::{ConfigError, RailError, RailResult};
use crate::release::guard::BalanceGuard;
use crate::release::manifest::{Manifest, ManifestEntry, ServiceStatus};
use crate::release::stage::{Stage, StageKind};
use crate::release::staging;
use crate::release::store::StepStore;
use crate::release::version::ReleaseRun;
use crate::tools::{Collaborators, notify_best_effort};
use crate::ui::progress::TargetProgress;
use tracing::{debug, info, info_span, warn};

/// What happened to one service during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOutcome {
  pub name: String,
  /// First stage that still had to run when the service was picked up
  pub resumed_from: StageKind,
  /// Stages executed by this run, in order
  pub executed: Vec<StageKind>,
  pub entry: ManifestEntry,
}

#[derive(Debug, Default)]
pub struct RunReport {
  pub outcomes: Vec<ServiceOutcome>,
  /// Services skipped as non-publishable
  pub skipped: Vec<String>,
  pub manifest: Manifest,
}

pub struct Orchestrator<'a> {
  run: ReleaseRun,
  targets: Vec<String>,
  paths: ReleasePaths,
  env: ReleaseEnv,
  min_balance: u64,
  tools: Collaborators<'a>,
  show_progress: bool,
}

impl<'a> Orchestrator<'a> {
  pub fn new(
    run: ReleaseRun,
    targets: Vec<String>,
    paths: ReleasePaths,
    env: ReleaseEnv,
    min_balance: u64,
    tools: Collaborators<'a>,
  ) -> Self {
    Self {
      run,
      targets,
      paths,
      env,
      min_balance,
      tools,
      show_progress: false,
    }
  }

  /// Draw a progress bar while packing
  pub fn with_progress(mut self, show: bool) -> Self {
    self.show_progress = show;
    self
  }

  /// Run the whole release for `descriptors`
  pub fn run(&self, descriptors: &[ServiceDescriptor]) -> RailResult<RunReport> {
    validate_descriptors(descriptors, &self.targets)?;

    let version = self.run.version();
    info!(channel = %self.run.channel, version = %version, services = descriptors.len(), "starting release run");

    let guard = BalanceGuard::new(self.tools.registrar, self.tools.notifier, self.min_balance);
    match guard.check(&self.env, self.run.channel) {
      Ok(()) => {}
      // the guard has already sent its own notice
      Err(e @ RailError::Precondition(_)) => return Err(e),
      Err(e) => {
        self.notify_failure("checking account balances", &e);
        return Err(e);
      }
    }

    let mut store = match StepStore::load(&self.paths.steps) {
      Ok(store) => store,
      Err(e) => {
        self.notify_failure("loading the step table", &e);
        return Err(e);
      }
    };
    if !store.is_empty() {
      info!(records = store.len(), path = %store.path().display(), "resuming from step table");
    }

    let mut report = RunReport::default();
    for descriptor in descriptors {
      if !descriptor.publish {
        info!(service = %descriptor.name, "not publishable, skipped");
        report.skipped.push(descriptor.name.clone());
        continue;
      }

      match self.release_service(descriptor, &mut store) {
        Ok(outcome) => {
          report.manifest.push(outcome.entry.clone());
          report.outcomes.push(outcome);
        }
        Err(e) => {
          let stage = store.next_stage(&descriptor.name);
          self.notify_failure(&format!("{} at {}", descriptor.name, stage), &e);
          return Err(e);
        }
      }
    }

    if let Err(e) = report.manifest.write(&self.paths.manifest) {
      self.notify_failure("writing the manifest", &e);
      return Err(e);
    }
    if let Err(e) = store.remove() {
      self.notify_failure("removing the step table", &e);
      return Err(e);
    }

    info!(published = report.manifest.len(), "release run complete");
    notify_best_effort(
      self.tools.notifier,
      &format!(
        "[fleet-rail] {} {} published {} service(s)",
        self.run.channel,
        version,
        report.manifest.len()
      ),
    );
    Ok(report)
  }

  fn release_service(&self, descriptor: &ServiceDescriptor, store: &mut StepStore) -> RailResult<ServiceOutcome> {
    let name = descriptor.name.as_str();
    let _span = info_span!("service", service = %name).entered();

    let id = descriptor.registry_id().ok_or_else(|| {
      RailError::Config(ConfigError::MissingRegistryId {
        service: name.to_string(),
      })
    })?;

    let resumed_from = store.next_stage(name);
    if resumed_from != StageKind::Pack {
      info!(stage = %resumed_from, "resuming");
    }
    let mut executed = Vec::new();

    if store.need(name, StageKind::Pack) {
      self.pack(descriptor)?;
      store.record(name, Stage::Pack)?;
      executed.push(StageKind::Pack);
    }

    if store.need(name, StageKind::Upload) {
      let artifacts = staging::artifact_dir(&self.paths, name);
      let fid = self.tools.uploader.upload(name, &artifacts)?;
      info!(stage = %StageKind::Upload, fid = %fid, "uploaded");
      store.record(name, Stage::Upload { fid })?;
      executed.push(StageKind::Upload);
    }

    if store.need(name, StageKind::SetVersion) {
      let fid = match store.get(name) {
        Some(Stage::Upload { fid }) => fid.clone(),
        other => {
          return Err(RailError::consistency(format!(
            "'{}' reached set-version without an uploaded fid (recorded: {:?})",
            name,
            other.map(Stage::kind)
          )));
        }
      };
      let version = self.run.version();
      self.tools.registrar.set_version(&fid, &version, id)?;
      info!(stage = %StageKind::SetVersion, version = %version, fid = %fid, "version registered");
      store.record(name, Stage::SetVersion { version })?;
      executed.push(StageKind::SetVersion);
    }

    let entry = self.finish(name, id, store)?;
    executed.push(StageKind::Finish);

    Ok(ServiceOutcome {
      name: name.to_string(),
      resumed_from,
      executed,
      entry,
    })
  }

  /// Pack every applicable target, one at a time
  fn pack(&self, descriptor: &ServiceDescriptor) -> RailResult<()> {
    let name = descriptor.name.as_str();
    let targets = descriptor.applicable_targets(&self.targets);
    staging::reset_artifact_dir(&self.paths, name)?;

    let mut progress = self.show_progress.then(|| TargetProgress::new(targets.len(), name));
    for target in targets {
      let staged = staging::prepare_target(&self.paths, descriptor, target)?;
      let archive = staging::archive_path(&self.paths, name, target);

      self.tools.packager.pack(name, target, &staged, &archive)?;
      staging::ensure_archive(&archive)?;
      staging::clear_target(&staged)?;

      debug!(platform = target, archive = %archive.display(), "packed");
      if let Some(progress) = progress.as_mut() {
        progress.inc();
      }
    }
    info!(stage = %StageKind::Pack, "packed");
    Ok(())
  }

  /// Turn the recorded SetVersion into a manifest entry
  fn finish(&self, name: &str, id: &str, store: &StepStore) -> RailResult<ManifestEntry> {
    let version = match store.get(name) {
      Some(Stage::SetVersion { version }) if !version.trim().is_empty() => version.clone(),
      _ => {
        return Err(RailError::consistency(format!(
          "'{}' reached finish without a recorded version",
          name
        )));
      }
    };

    let run_version = self.run.version();
    if version != run_version {
      warn!(recorded = %version, run = %run_version, "step table holds a version from another build, keeping it");
    }

    Ok(ManifestEntry {
      id: id.to_string(),
      version,
      status: ServiceStatus::Active,
    })
  }

  fn notify_failure(&self, subject: &str, err: &RailError) {
    notify_best_effort(
      self.tools.notifier,
      &format!(
        "[fleet-rail] {} {} failed while {}: {}",
        self.run.channel,
        self.run.version(),
        subject,
        err
      ),
    );
  }
}

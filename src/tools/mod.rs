//! External collaborators of the release pipeline
//!
//! Each collaborator is a narrow trait with one production implementation:
//!
//! - **Packager**: turns a staging directory into one archive per target
//! - **Uploader**: pushes a service's artifact tree to the content repository
//! - **Registrar**: commits version records, resolves accounts, reads balances
//! - **Notifier**: best-effort alerts on failure and completion
//!
//! The process-backed implementations render the command templates from
//! fleet.toml; the notifier posts to a webhook.

pub mod command;
pub mod notify;
pub mod process;

use crate::core::error::RailResult;
use std::path::Path;
use tracing::warn;

pub use notify::WebhookNotifier;
pub use process::{ProcessPackager, ProcessRegistrar, ProcessUploader};

pub trait Packager {
  /// Produce `archive` from the contents of `staging`
  fn pack(&self, service: &str, target: &str, staging: &Path, archive: &Path) -> RailResult<()>;
}

pub trait Uploader {
  /// Upload the artifact tree of `service`, returning its content identifier
  fn upload(&self, service: &str, artifacts: &Path) -> RailResult<String>;
}

pub trait Registrar {
  /// Commit `version` of service `id`, pointing at content `fid`
  fn set_version(&self, fid: &str, version: &str, id: &str) -> RailResult<()>;

  /// Object id of the account described by `desc`
  fn account_id(&self, desc: &Path) -> RailResult<String>;

  /// Balances of `ids`, in the same order, in one request
  fn balances(&self, ids: &[String]) -> RailResult<Vec<u64>>;
}

pub trait Notifier {
  fn notify(&self, message: &str) -> RailResult<()>;
}

/// Send a notification, logging instead of failing when delivery fails
pub fn notify_best_effort(notifier: &dyn Notifier, message: &str) {
  if let Err(e) = notifier.notify(message) {
    warn!(error = %e, "notification not delivered");
  }
}

/// The four collaborators a release run talks to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
  pub packager: &'a dyn Packager,
  pub uploader: &'a dyn Uploader,
  pub registrar: &'a dyn Registrar,
  pub notifier: &'a dyn Notifier,
}

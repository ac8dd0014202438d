//! Balance guard run before any stage work
//!
//! Re-runs on every invocation, resumed runs included: balances can change
//! between runs.

use crate::core::env::ReleaseEnv;
use crate::core::error::{ExternalError, PreconditionError, RailError, RailResult};
use crate::release::version::Channel;
use crate::tools::{Notifier, Registrar, notify_best_effort};
use tracing::{info, warn};

pub struct BalanceGuard<'a> {
  registrar: &'a dyn Registrar,
  notifier: &'a dyn Notifier,
  min_balance: u64,
}

impl<'a> BalanceGuard<'a> {
  pub fn new(registrar: &'a dyn Registrar, notifier: &'a dyn Notifier, min_balance: u64) -> Self {
    Self {
      registrar,
      notifier,
      min_balance,
    }
  }

  /// Check the publishing and file-distribution accounts
  ///
  /// Sends exactly one notification when any account is short.
  pub fn check(&self, env: &ReleaseEnv, channel: Channel) -> RailResult<()> {
    let publisher = self.registrar.account_id(&env.desc_path)?;
    let distributor = if env.file_desc_path == env.desc_path {
      publisher.clone()
    } else {
      self.registrar.account_id(&env.file_desc_path)?
    };

    let ids = vec![publisher, distributor];
    let balances = self.registrar.balances(&ids)?;
    if balances.len() != ids.len() {
      return Err(RailError::External(ExternalError::BadOutput {
        tool: "balance".to_string(),
        reason: format!("expected {} balances, got {}", ids.len(), balances.len()),
      }));
    }

    let mut deficient: Vec<(String, u64)> = Vec::new();
    for (id, balance) in ids.iter().zip(balances) {
      info!(account = %id, balance, minimum = self.min_balance, "account balance");
      if balance < self.min_balance && !deficient.iter().any(|(d, _)| d == id) {
        deficient.push((id.clone(), balance));
      }
    }

    if deficient.is_empty() {
      return Ok(());
    }

    let err = PreconditionError::InsufficientBalance {
      channel: channel.to_string(),
      accounts: deficient,
      minimum: self.min_balance,
    };
    warn!("{}", err);
    notify_best_effort(self.notifier, &format!("[fleet-rail] {}", err));
    Err(RailError::Precondition(err))
  }
}

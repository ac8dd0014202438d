//! Publish command implementation
//!
//! Resolves everything a run needs up front (channel, build, selection,
//! config, environment) and only then hands over to the orchestrator.

use crate::core::config::{FleetConfig, parse_publish_kinds, split_list};
use crate::core::env::ReleaseEnv;
use crate::core::error::{ConfigError, RailError, RailResult};
use crate::release::orchestrator::{Orchestrator, RunReport};
use crate::release::stage::StageKind;
use crate::release::version::ReleaseRun;
use crate::tools::{Collaborators, ProcessPackager, ProcessRegistrar, ProcessUploader, WebhookNotifier};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Positional arguments of a publish run, as typed
pub struct PublishArgs {
  pub targets: String,
  pub publish_types: String,
  pub channel: String,
  pub build_number: String,
  pub config: PathBuf,
}

/// Run the publish command
pub fn run_publish(args: PublishArgs) -> RailResult<()> {
  let run = ReleaseRun::parse(&args.channel, &args.build_number)?;

  let targets = split_list(&args.targets);
  if targets.is_empty() {
    return Err(RailError::Config(ConfigError::Invalid {
      reason: "no target given".to_string(),
    }));
  }
  let kinds = parse_publish_kinds(&args.publish_types)?;

  let config = FleetConfig::load(&args.config)?;
  let root = workspace_root(&args.config)?;
  let release_env = ReleaseEnv::from_env()?;

  let descriptors = config.select(&kinds);
  let paths = config.paths.resolve(&root);

  println!(
    "🚀 Publishing {} descriptor(s) as {} on {}",
    descriptors.len(),
    run.version(),
    run.channel
  );
  println!("   targets: {}", targets.join(", "));

  let packager = ProcessPackager::new(&config.commands, &root);
  let uploader = ProcessUploader::new(&config.commands, &root, &release_env.file_desc_path);
  let registrar = ProcessRegistrar::new(&config.commands, &root, &release_env.desc_path);
  let notifier = WebhookNotifier::new(&config.notify, &release_env.notify_token)?;

  let tools = Collaborators {
    packager: &packager,
    uploader: &uploader,
    registrar: &registrar,
    notifier: &notifier,
  };

  let report = Orchestrator::new(run, targets, paths.clone(), release_env, config.guard.min_balance, tools)
    .with_progress(std::io::stderr().is_terminal())
    .run(&descriptors)?;

  print_report(&report, &paths.manifest);
  Ok(())
}

/// Directory the fleet config lives in; every configured path hangs off it
fn workspace_root(config: &Path) -> RailResult<PathBuf> {
  let cwd = env::current_dir()?;
  Ok(match config.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
    _ => cwd,
  })
}

fn print_report(report: &RunReport, manifest: &Path) {
  println!();
  for outcome in &report.outcomes {
    let ran: Vec<String> = outcome.executed.iter().map(StageKind::to_string).collect();
    if outcome.resumed_from == StageKind::Pack {
      println!("✅ {} {} ({})", outcome.name, outcome.entry.version, ran.join(" → "));
    } else {
      println!(
        "✅ {} {} (resumed at {}: {})",
        outcome.name,
        outcome.entry.version,
        outcome.resumed_from,
        ran.join(" → ")
      );
    }
  }
  for name in &report.skipped {
    println!("⏭️  {} (not publishable)", name);
  }
  println!();
  println!("📦 Manifest: {} ({} entries)", manifest.display(), report.manifest.len());
}

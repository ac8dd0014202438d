//! Structured logging on stderr
//!
//! `RUST_LOG` wins when set; otherwise `--verbose` picks between the
//! info and debug defaults.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn default_directive(verbose: bool) -> &'static str {
  if verbose { "fleet_rail=debug,info" } else { "fleet_rail=info,warn" }
}

/// Install the global subscriber; a second call is a no-op
pub fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(
      fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact(),
    )
    .try_init();
}

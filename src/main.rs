mod commands;
mod core;
mod logging;
mod release;
mod tools;
mod ui;
mod utils;

use clap::Parser;
use core::config::DEFAULT_CONFIG_FILE;
use core::error::{RailError, print_error};
use std::path::PathBuf;

/// Pack, upload and register a fleet of service binaries, resuming where the
/// last run stopped
#[derive(Parser)]
#[command(name = "fleet-rail")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Semicolon-separated build targets (e.g. "x86_64-unknown-linux-gnu;x86_64-pc-windows-msvc")
  targets: String,

  /// Semicolon-separated publish types: services, tools
  publish_types: String,

  /// Release channel: nightly, beta or stable
  channel: String,

  /// Build number, the last component of the published version
  build_number: String,

  /// Fleet configuration file
  #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// Log at debug level
  #[arg(short, long)]
  verbose: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  logging::init_tracing(cli.verbose);

  let result = commands::run_publish(commands::PublishArgs {
    targets: cli.targets,
    publish_types: cli.publish_types,
    channel: cli.channel,
    build_number: cli.build_number,
    config: cli.config,
  });

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

mod checks;
mod commands;
mod core;
mod gateway;
mod release;
mod ui;
mod workflow;

use clap::{Args, Parser, Subcommand};
use core::error::{ShipError, print_error};
use release::version::Version;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use workflow::RunOptions;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SHIPRAIL_LOG";

/// Idempotent, fail-fast package releases: gates, changelog, publish, tag, release
#[derive(Parser)]
#[command(name = "shiprail")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,

  #[command(flatten)]
  release: ReleaseFlags,

  /// Project directory (default: current directory)
  #[arg(short = 'C', long = "dir", global = true, value_name = "PATH")]
  dir: Option<PathBuf>,

  /// Config file (default: shiprail.toml in the project directory)
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,

  /// Output in JSON format
  #[arg(long, global = true)]
  json: bool,

  /// Print shiprail's own version
  #[arg(short = 'V', long = "tool-version", action = clap::ArgAction::Version)]
  #[allow(dead_code)]
  tool_version: Option<bool>,
}

/// Flags for the release run (no subcommand)
#[derive(Args)]
struct ReleaseFlags {
  /// Run every check and show what would be published, without mutating anything
  #[arg(long)]
  dry_run: bool,

  /// Release this version instead of the manifest's (X.Y.Z)
  #[arg(long, value_parser = parse_version, value_name = "X.Y.Z")]
  version: Option<Version>,

  /// Branch to sync and push (default: current branch)
  #[arg(long, value_name = "NAME")]
  branch: Option<String>,

  /// Answer yes at every confirmation checkpoint
  #[arg(short, long)]
  yes: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the resolved release workflow and its plan id
  Plan {
    /// Plan for this version instead of the manifest's
    #[arg(long, value_parser = parse_version, value_name = "X.Y.Z")]
    version: Option<Version>,
  },

  /// Print release notes from the changelog (latest entry by default)
  Notes {
    /// Version whose notes to print
    #[arg(value_parser = parse_version)]
    version: Option<Version>,
  },

  /// Write a default shiprail.toml
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },

  /// Write the commit log for a date range to a file
  History {
    /// Start date, YYYY-MM-DD (default: 2024-10-01)
    #[arg(long)]
    since: Option<String>,
    /// End date, YYYY-MM-DD (default: tomorrow)
    #[arg(long)]
    until: Option<String>,
    /// Output file (default: commit_details_<since>-<until>.log)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn parse_version(raw: &str) -> Result<Version, String> {
  raw.parse::<Version>().map_err(|err| err.to_string())
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

fn init_tracing() {
  // Logs go to stderr; stdout carries the reporter and JSON output
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing();

  let root = match cli.dir {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(ShipError::Io(e)),
    },
  };

  // init runs before a config exists, so it only needs the root
  if let Some(Commands::Init { force }) = cli.command {
    if let Err(err) = commands::run_init(&root, force) {
      handle_error(err);
    }
    return;
  }

  // Build project context once (root + config)
  let ctx = match core::context::ProjectContext::build(&root, cli.config.as_deref()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    None => {
      let args = commands::ReleaseArgs {
        options: RunOptions {
          dry_run: cli.release.dry_run,
          version: cli.release.version,
          branch: cli.release.branch,
        },
        yes: cli.release.yes,
        json: cli.json,
      };
      match commands::run_release(&ctx, args) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(e) => Err(e),
      }
    }
    Some(Commands::Plan { version }) => commands::run_plan(&ctx, version, cli.json),
    Some(Commands::Notes { version }) => commands::run_notes(&ctx, version, cli.json),
    Some(Commands::History { since, until, output }) => commands::run_history(&ctx, since, until, output),
    Some(Commands::Init { .. }) => Ok(()),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ShipError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

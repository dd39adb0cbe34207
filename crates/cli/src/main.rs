mod cmd;
mod load;
mod output;
mod target;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_check, cmd_graph, cmd_info, cmd_plan};
use output::{OutputFormat, print_error};
use target::TargetArgs;

/// modplan - module dependency resolver and build planner
#[derive(Parser)]
#[command(name = "modplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve descriptors and print the staged build plan
  Plan {
    /// Descriptor file, or directory searched recursively for *.toml
    path: PathBuf,

    #[command(flatten)]
    target: TargetArgs,

    /// Fail when no modules are found
    #[arg(long)]
    require_nonempty: bool,
  },

  /// Validate descriptors and report every configuration error
  Check {
    /// Descriptor file, or directory searched recursively for *.toml
    path: PathBuf,

    #[command(flatten)]
    target: TargetArgs,
  },

  /// Print the resolved module graph in Graphviz DOT
  Graph {
    /// Descriptor file, or directory searched recursively for *.toml
    path: PathBuf,

    #[command(flatten)]
    target: TargetArgs,
  },

  /// Show the detected platform and the tags it contributes
  Info,
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Plan {
      path,
      target,
      require_nonempty,
    } => cmd_plan(&path, &target, require_nonempty, cli.format, cli.verbose),
    Commands::Check { path, target } => cmd_check(&path, &target, cli.format),
    Commands::Graph { path, target } => cmd_graph(&path, &target),
    Commands::Info => cmd_info(cli.format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }

  #[test]
  fn plan_accepts_repeated_features() {
    let cli = Cli::try_parse_from([
      "modplan",
      "plan",
      "modules",
      "--target",
      "x86_64-windows",
      "--feature",
      "editor",
      "--feature",
      "server",
    ])
    .unwrap();

    let Commands::Plan { target, .. } = cli.command else {
      panic!("expected plan command");
    };
    assert_eq!(target.features, vec!["editor", "server"]);
    assert_eq!(target.target.map(|p| p.triple()), Some("x86_64-windows".to_string()));
  }
}

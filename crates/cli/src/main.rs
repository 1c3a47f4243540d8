use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

/// forge - Incremental build orchestrator for native C/C++ projects
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the project manifest
  #[arg(short, long, global = true, default_value = "forge.toml")]
  manifest: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a target and everything it links
  Build {
    /// Target name from the manifest
    target: String,
  },

  /// Remove a target's objects, then build it from scratch
  Rebuild {
    target: String,
  },

  /// Build a target, then run the produced executable
  Run {
    target: String,
  },

  /// Remove a target's own objects and dependency files
  Clean {
    target: String,
  },

  /// Remove objects across a target's whole link closure
  CleanAll {
    target: String,
  },

  /// Configure, build, and install an external target
  Install {
    target: String,

    /// Run the install step without privilege escalation
    #[arg(long)]
    no_sudo: bool,
  },

  /// Print the compile command for one source of a target
  Flags {
    target: String,
    source: PathBuf,
  },

  /// Export a target's resolved compile configuration as JSON
  Export {
    target: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { target } => cmd::build::cmd_build(&cli.manifest, &target),
    Commands::Rebuild { target } => cmd::build::cmd_rebuild(&cli.manifest, &target),
    Commands::Run { target } => cmd::build::cmd_run(&cli.manifest, &target),
    Commands::Clean { target } => cmd::clean::cmd_clean(&cli.manifest, &target),
    Commands::CleanAll { target } => cmd::clean::cmd_clean_all(&cli.manifest, &target),
    Commands::Install { target, no_sudo } => cmd::install::cmd_install(&cli.manifest, &target, no_sudo),
    Commands::Flags { target, source } => cmd::flags::cmd_flags(&cli.manifest, &target, &source),
    Commands::Export { target, output } => cmd::export::cmd_export(&cli.manifest, &target, output.as_deref()),
  }
}

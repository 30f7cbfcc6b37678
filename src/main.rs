//! vmassemble CLI entry point.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vmassemble::Defaults;

mod cli;

/// vmassemble - assemble VM launch configurations
#[derive(Parser, Debug)]
#[command(name = "vmassemble")]
#[command(about = "Assemble validated VM launch configurations")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a VM configuration and write it as a manifest.
    Build(cli::build::BuildCmd),

    /// Show host capabilities and derived guest resources.
    Host(cli::host::HostCmd),

    /// Manage the defaults file.
    #[command(subcommand)]
    Config(cli::config::ConfigCmd),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on RUST_LOG or default to warn
    init_logging(cli.log_json);

    tracing::debug!(version = vmassemble::VERSION, "starting vmassemble");

    // Load defaults
    let defaults = match Defaults::load() {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load defaults, using built-in values");
            Defaults::default()
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Build(cmd) => cmd.run(&defaults),
        Commands::Host(cmd) => cmd.run(&defaults),
        Commands::Config(cmd) => cmd.run(&defaults),
    };

    // Handle errors
    if let Err(e) = result {
        tracing::error!(error = %e, fatal = e.is_fatal_precondition(), "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vmassemble=warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

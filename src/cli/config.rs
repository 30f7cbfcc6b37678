//! Configuration CLI commands.
//!
//! Commands for inspecting and creating the defaults file.

use clap::{Args, Subcommand};
use vmassemble::{Defaults, Result};

/// Configuration commands
#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Show the effective defaults
    Show,

    /// Show the path to the defaults file
    Path,

    /// Write the built-in defaults to the defaults file
    Init(InitCmd),
}

impl ConfigCmd {
    pub fn run(self, defaults: &Defaults) -> Result<()> {
        match self {
            ConfigCmd::Show => show(defaults),
            ConfigCmd::Path => {
                let path = Defaults::config_path()?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCmd::Init(cmd) => cmd.run(),
        }
    }
}

fn show(defaults: &Defaults) -> Result<()> {
    println!("Defaults:");
    if let Ok(path) = Defaults::config_path() {
        println!("  Config file: {}", path.display());
        if path.exists() {
            println!("  Status: configured");
        } else {
            println!("  Status: not configured (using built-in defaults)");
        }
    }
    println!(
        "  Baseline memory: {} MiB",
        defaults.memory_size / (1024 * 1024)
    );
    println!("  Display: {}", defaults.display);
    let origin = if defaults.mac_address.is_locally_administered() {
        "locally administered"
    } else {
        "vendor assigned"
    };
    println!("  MAC address: {} ({})", defaults.mac_address, origin);
    Ok(())
}

/// Write the built-in defaults to the defaults file
#[derive(Args, Debug)]
pub struct InitCmd {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

impl InitCmd {
    pub fn run(self) -> Result<()> {
        let path = Defaults::config_path()?;
        if path.exists() && !self.force {
            return Err(vmassemble::Error::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        let path = Defaults::default().save()?;
        println!("Wrote defaults to {}", path.display());
        Ok(())
    }
}

//! Build command implementation.

use super::parsers::parse_memory_size;
use clap::Args;
use std::path::PathBuf;
use vmassemble::vm::{submit, Display, ManifestEngine, OutputFormat};
use vmassemble::{BuildRequest, ConfigurationBuilder, Defaults, MacAddress, SystemHost};

/// Assemble a VM configuration and hand it off as a manifest.
#[derive(Args, Debug)]
pub struct BuildCmd {
    /// Boot disk image (raw).
    pub disk_image: PathBuf,

    /// Host directory to share with the guest.
    ///
    /// A missing or invalid directory is reported and skipped.
    pub shared_dir: Option<PathBuf>,

    /// Attach the disk read-only.
    #[arg(long)]
    pub read_only: bool,

    /// Number of vCPUs (default: host cores minus one).
    #[arg(long)]
    pub cpus: Option<u32>,

    /// Guest memory (e.g. 4096, 8G). Plain numbers are MiB.
    #[arg(long, value_parser = parse_memory_size)]
    pub memory: Option<u64>,

    /// Display geometry (WIDTHxHEIGHT[@PPI]).
    #[arg(long)]
    pub display: Option<Display>,

    /// Network hardware address (aa:bb:cc:dd:ee:ff).
    #[arg(long)]
    pub mac: Option<MacAddress>,

    /// Manifest format (json, toml, yaml).
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write the manifest to a file instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl BuildCmd {
    /// Execute the build command.
    pub fn run(self, defaults: &Defaults) -> vmassemble::Result<()> {
        let host = SystemHost::detect()?;

        let mut request = BuildRequest::new(&self.disk_image).read_only(self.read_only);
        if let Some(dir) = self.shared_dir {
            request = request.shared_directory(dir);
        }
        if let Some(cpus) = self.cpus {
            request = request.cpus(cpus);
        }
        if let Some(bytes) = self.memory {
            request = request.memory_size(bytes);
        }
        if let Some(display) = self.display {
            request = request.display(display);
        }
        if let Some(mac) = self.mac {
            request = request.mac_address(mac);
        }

        let config = ConfigurationBuilder::new(&host, defaults).build(request)?;

        let engine = ManifestEngine::new(self.format, self.output.clone());
        submit(&engine, config)?;

        if let Some(path) = &self.output {
            eprintln!("Wrote configuration to {}", path.display());
        }
        Ok(())
    }
}

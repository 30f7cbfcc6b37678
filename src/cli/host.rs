//! Host command implementation.

use clap::Args;
use vmassemble::vm::devices::{create_keyboard_device, create_pointing_device};
use vmassemble::{ConfigurationBuilder, Defaults, HostCapabilities, SystemHost};

/// Show host capabilities and the resources a VM would get.
#[derive(Args, Debug)]
pub struct HostCmd {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

impl HostCmd {
    /// Execute the host command.
    pub fn run(self, defaults: &Defaults) -> vmassemble::Result<()> {
        let host = SystemHost::detect()?;
        let builder = ConfigurationBuilder::new(&host, defaults);

        let cpu_limits = host.cpu_limits();
        let memory_limits = host.memory_limits();
        let version = host.platform_version();
        let cpus = builder.cpu_count(None);
        let memory = builder.memory_size(None);
        let keyboard = create_keyboard_device(version);
        let pointing = create_pointing_device(version);

        if self.json {
            let value = serde_json::json!({
                "logical_cpu_count": host.logical_cpu_count(),
                "cpu_limits": [cpu_limits.minimum(), cpu_limits.maximum()],
                "memory_limits": [memory_limits.minimum(), memory_limits.maximum()],
                "platform_version": version.map(|v| v.to_string()),
                "cpu_count": cpus,
                "memory_size": memory,
                "keyboard": keyboard,
                "pointing": pointing,
            });
            let text = serde_json::to_string_pretty(&value)
                .map_err(|e| vmassemble::Error::Serialize(e.to_string()))?;
            println!("{}", text);
            return Ok(());
        }

        println!("Host:");
        println!("  Logical CPUs: {}", host.logical_cpu_count());
        println!(
            "  Platform version: {}",
            version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!("  {} limits: {}", cpu_limits.resource(), cpu_limits);
        println!(
            "  {} limits: [{} MiB, {} MiB]",
            memory_limits.resource(),
            memory_limits.minimum() / (1024 * 1024),
            memory_limits.maximum() / (1024 * 1024)
        );
        println!();
        println!("Guest:");
        println!("  vCPUs: {}", cpus);
        println!("  Memory: {} MiB", memory / (1024 * 1024));
        println!("  Keyboard: {:?}", keyboard);
        println!("  Pointing: {:?}", pointing);

        Ok(())
    }
}

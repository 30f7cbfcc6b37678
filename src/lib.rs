//! vmassemble - resource sizing and device assembly for VM launches.
//!
//! Given the host's capabilities and a few per-launch inputs, vmassemble
//! produces a [`VmConfiguration`] whose CPU and memory values are guaranteed
//! to satisfy the platform's limits, with a fixed set of devices attached:
//! boot loader, disk, graphics, network, audio, pointing, keyboard, shared
//! directory and a clipboard-bridging console.
//!
//! ```no_run
//! use vmassemble::{BuildRequest, ConfigurationBuilder, Defaults, SystemHost};
//!
//! # fn main() -> vmassemble::Result<()> {
//! let host = SystemHost::detect()?;
//! let defaults = Defaults::load()?;
//! let config = ConfigurationBuilder::new(&host, &defaults)
//!     .build(BuildRequest::new("disk.img").shared_directory("/Users/me/share"))?;
//! println!("{} vCPUs, {} bytes", config.cpu_count, config.memory_size);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod mount;
pub mod network;
pub mod storage;
pub mod vm;

pub use config::Defaults;
pub use error::{Error, Result};
pub use host::{FixedHost, HostCapabilities, PlatformVersion, SystemHost};
pub use mount::SharedDirectoryDevice;
pub use network::{MacAddress, NetworkDevice};
pub use storage::DiskDevice;
pub use vm::{BuildRequest, ConfigurationBuilder, ResourceLimits, VmConfiguration, VmEngine};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

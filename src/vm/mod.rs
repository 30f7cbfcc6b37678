//! VM configuration assembly.
//!
//! This module provides the core abstractions for describing a VM launch:
//! - [`VmConfiguration`]: The finished, validated configuration
//! - [`ConfigurationBuilder`]: Assembles a configuration from host capabilities
//! - [`VmEngine`]: Trait for engines that consume a configuration

pub mod config;
pub mod devices;
pub mod engine;
pub mod limits;

use crate::error::{Error, Result};

pub use config::{BuildRequest, ConfigurationBuilder, VmConfiguration};
pub use devices::{
    AudioDevice, BootLoader, ConsoleDevice, Display, GraphicsDevice, KeyboardDevice, PointingDevice,
};
pub use engine::{ManifestEngine, OutputFormat};
pub use limits::{compute_cpu_count, compute_memory_size, ResourceLimits};

/// Consumer of finished configurations.
///
/// The engine owns everything after hand-off: its own validation, creating
/// the machine and running it.
pub trait VmEngine {
    /// Engine name (e.g., "manifest").
    fn name(&self) -> &'static str;

    /// Check if this engine can accept configurations right now.
    fn is_available(&self) -> bool;

    /// Take ownership of a configuration.
    fn submit(&self, config: VmConfiguration) -> Result<()>;
}

/// Hand a configuration to an engine, checking availability first.
///
/// # Errors
///
/// Returns [`Error::EngineUnavailable`] if the engine cannot accept it, or
/// whatever the engine reports.
pub fn submit(engine: &dyn VmEngine, config: VmConfiguration) -> Result<()> {
    if !engine.is_available() {
        return Err(Error::EngineUnavailable(format!(
            "{} engine is not available",
            engine.name()
        )));
    }
    tracing::info!(engine = engine.name(), "submitting vm configuration");
    engine.submit(config)
}

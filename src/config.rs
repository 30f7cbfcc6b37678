//! Default policy values.
//!
//! Every constant the device builders would otherwise hardcode (baseline
//! memory, display geometry, network hardware address) lives in
//! [`Defaults`]. The table is persisted as TOML so values can be overridden
//! without touching construction logic; a missing file means built-in
//! defaults.

use crate::error::{Error, Result};
use crate::network::MacAddress;
use crate::vm::devices::Display;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name for config file storage.
const APP_NAME: &str = "vmassemble";

/// Config file name inside the application config directory.
const CONFIG_FILENAME: &str = "config.toml";

/// Baseline guest memory before clamping (4 GiB).
pub const DEFAULT_MEMORY_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Default display width in pixels.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 1920;

/// Default display height in pixels.
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 1200;

/// Default display pixel density.
pub const DEFAULT_PIXELS_PER_INCH: u32 = 80;

/// Default hardware address of the guest network interface.
pub const DEFAULT_MAC_ADDRESS: MacAddress = MacAddress::new([0xd6, 0xa7, 0x58, 0x8e, 0x78, 0xd4]);

/// Overridable defaults used when assembling a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Configuration format version.
    pub version: u8,

    /// Baseline guest memory in bytes, clamped to platform limits.
    pub memory_size: u64,

    /// Hardware address of the guest network interface.
    pub mac_address: MacAddress,

    /// Display attached to the graphics device.
    pub display: Display,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            version: 1,
            memory_size: DEFAULT_MEMORY_SIZE,
            mac_address: DEFAULT_MAC_ADDRESS,
            display: Display::new(
                DEFAULT_DISPLAY_WIDTH,
                DEFAULT_DISPLAY_HEIGHT,
                DEFAULT_PIXELS_PER_INCH,
            ),
        }
    }
}

impl Defaults {
    /// Path of the defaults file.
    ///
    /// On macOS: `~/Library/Application Support/vmassemble/config.toml`
    /// On Linux: `~/.config/vmassemble/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigLoad("could not determine config directory".into()))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILENAME))
    }

    /// Load defaults from the standard location.
    ///
    /// If the file doesn't exist, returns the built-in defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load defaults from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no defaults file, using built-in defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        let defaults: Self = toml::from_str(&text)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        defaults.validate()?;

        tracing::debug!(path = %path.display(), "loaded defaults");
        Ok(defaults)
    }

    /// Save defaults to the standard location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save defaults to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::ConfigSave(format!("{}: {}", parent.display(), e)))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| Error::ConfigSave(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| Error::ConfigSave(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Reject values no platform would accept.
    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 {
            return Err(Error::config("memory_size must be greater than zero"));
        }
        self.display.validate()?;
        self.mac_address.ensure_unicast()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.memory_size, 4 * 1024 * 1024 * 1024);
        assert_eq!(defaults.display.width_px, 1920);
        assert_eq!(defaults.display.height_px, 1200);
        assert_eq!(defaults.display.pixels_per_inch, 80);
        assert_eq!(defaults.mac_address.to_string(), "d6:a7:58:8e:78:d4");
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Defaults::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Defaults::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let defaults = Defaults {
            memory_size: 8 * 1024 * 1024 * 1024,
            display: Display::new(2560, 1600, 110),
            ..Default::default()
        };
        defaults.save_to(&path).unwrap();

        let loaded = Defaults::load_from(&path).unwrap();
        assert_eq!(loaded, defaults);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mac_address = \"02:00:00:00:00:01\"\n").unwrap();

        let loaded = Defaults::load_from(&path).unwrap();
        assert_eq!(loaded.mac_address.to_string(), "02:00:00:00:00:01");
        assert_eq!(loaded.memory_size, DEFAULT_MEMORY_SIZE);
        assert_eq!(loaded.display, Defaults::default().display);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "memory_size = 0\n").unwrap();
        assert!(Defaults::load_from(&path).is_err());

        // Multicast addresses cannot be assigned to an interface
        std::fs::write(&path, "mac_address = \"01:00:5e:00:00:01\"\n").unwrap();
        assert!(Defaults::load_from(&path).is_err());

        std::fs::write(&path, "mac_address = \"not-a-mac\"\n").unwrap();
        let err = Defaults::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }
}

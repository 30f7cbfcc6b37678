//! VM configuration assembly.
//!
//! [`ConfigurationBuilder`] combines host capabilities, the defaults table and
//! a per-launch [`BuildRequest`] into one [`VmConfiguration`]. The disk is
//! attached first because it is the only fatal step; everything else either
//! cannot fail or degrades to a smaller configuration.

use crate::config::Defaults;
use crate::error::Result;
use crate::host::HostCapabilities;
use crate::mount::{create_shared_directory_devices, SharedDirectoryDevice};
use crate::network::{create_network_device, MacAddress, NetworkDevice};
use crate::storage::{create_disk_device, DiskDevice};
use crate::vm::devices::{
    create_audio_device, create_boot_loader, create_console_device, create_graphics_device,
    create_keyboard_device, create_pointing_device, AudioDevice, BootLoader, ConsoleDevice,
    Display, GraphicsDevice, KeyboardDevice, PointingDevice,
};
use crate::vm::limits::{compute_cpu_count, compute_memory_size_from, ResourceLimits};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete configuration for one VM launch.
///
/// Produced once per launch and handed to the engine by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfiguration {
    /// Number of vCPUs.
    pub cpu_count: u32,

    /// Guest memory in bytes.
    pub memory_size: u64,

    /// Pointing device.
    pub pointing: PointingDevice,

    /// Keyboard device.
    pub keyboard: KeyboardDevice,

    /// Boot loader.
    pub boot_loader: BootLoader,

    /// Boot disk (virtio-blk).
    pub disk: DiskDevice,

    /// Graphics device.
    pub graphics: GraphicsDevice,

    /// Network device (virtio-net).
    pub network: NetworkDevice,

    /// Sound device (virtio-snd).
    pub audio: AudioDevice,

    /// Console device with the clipboard bridge.
    pub console: ConsoleDevice,

    /// Host directory shares (virtio-fs), possibly empty.
    pub shared_directories: Vec<SharedDirectoryDevice>,
}

impl VmConfiguration {
    /// Check the resource fields against platform limits.
    pub fn validate(
        &self,
        cpu_limits: &ResourceLimits<u32>,
        memory_limits: &ResourceLimits<u64>,
    ) -> Result<()> {
        cpu_limits.check(self.cpu_count)?;
        memory_limits.check(self.memory_size)?;
        Ok(())
    }
}

/// Per-launch inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Path to the boot disk image.
    pub disk_image: PathBuf,

    /// Attach the disk read-only.
    pub disk_read_only: bool,

    /// Host directory to share with the guest.
    pub shared_directory: Option<PathBuf>,

    /// Requested vCPU count (clamped); `None` derives it from the host.
    pub cpus: Option<u32>,

    /// Requested memory in bytes (clamped); `None` uses the defaults table.
    pub memory_size: Option<u64>,

    /// Display override.
    pub display: Option<Display>,

    /// Network hardware address override.
    pub mac_address: Option<MacAddress>,
}

impl BuildRequest {
    /// Create a request for the given disk image.
    pub fn new(disk_image: impl Into<PathBuf>) -> Self {
        Self {
            disk_image: disk_image.into(),
            disk_read_only: false,
            shared_directory: None,
            cpus: None,
            memory_size: None,
            display: None,
            mac_address: None,
        }
    }

    /// Attach the disk read-only.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.disk_read_only = read_only;
        self
    }

    /// Share a host directory.
    pub fn shared_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.shared_directory = Some(path.into());
        self
    }

    /// Request a vCPU count.
    pub fn cpus(mut self, cpus: u32) -> Self {
        self.cpus = Some(cpus);
        self
    }

    /// Request a memory size in bytes.
    pub fn memory_size(mut self, bytes: u64) -> Self {
        self.memory_size = Some(bytes);
        self
    }

    /// Override the display.
    pub fn display(mut self, display: Display) -> Self {
        self.display = Some(display);
        self
    }

    /// Override the network hardware address.
    pub fn mac_address(mut self, mac: MacAddress) -> Self {
        self.mac_address = Some(mac);
        self
    }
}

/// Assembles [`VmConfiguration`]s for a host.
pub struct ConfigurationBuilder<'a, H: HostCapabilities + ?Sized> {
    host: &'a H,
    defaults: &'a Defaults,
}

impl<'a, H: HostCapabilities + ?Sized> ConfigurationBuilder<'a, H> {
    /// Create a builder for the given host and defaults.
    pub fn new(host: &'a H, defaults: &'a Defaults) -> Self {
        Self { host, defaults }
    }

    /// vCPU count for a launch, within the host's limits.
    pub fn cpu_count(&self, requested: Option<u32>) -> u32 {
        let limits = self.host.cpu_limits();
        match requested {
            None => compute_cpu_count(self.host.logical_cpu_count(), &limits),
            Some(cpus) => {
                let clamped = limits.clamp(cpus);
                if clamped != cpus {
                    tracing::debug!(requested = cpus, clamped, %limits, "clamped cpu count");
                }
                clamped
            }
        }
    }

    /// Memory size in bytes for a launch, within the host's limits.
    pub fn memory_size(&self, requested: Option<u64>) -> u64 {
        let limits = self.host.memory_limits();
        let baseline = requested.unwrap_or(self.defaults.memory_size);
        let size = compute_memory_size_from(baseline, &limits);
        if size != baseline {
            tracing::debug!(requested = baseline, clamped = size, %limits, "clamped memory size");
        }
        size
    }

    /// Assemble the configuration for one launch.
    ///
    /// # Errors
    ///
    /// Fails without producing a configuration when the disk image cannot be
    /// attached or an override is unusable.
    pub fn build(&self, request: BuildRequest) -> Result<VmConfiguration> {
        let disk = create_disk_device(&request.disk_image, request.disk_read_only)?;

        let display = request.display.unwrap_or(self.defaults.display);
        display.validate()?;

        let mac_address = request.mac_address.unwrap_or(self.defaults.mac_address);
        mac_address.ensure_unicast()?;

        let platform = self.host.platform_version();

        let config = VmConfiguration {
            cpu_count: self.cpu_count(request.cpus),
            memory_size: self.memory_size(request.memory_size),
            pointing: create_pointing_device(platform),
            keyboard: create_keyboard_device(platform),
            boot_loader: create_boot_loader(),
            disk,
            graphics: create_graphics_device(&display),
            network: create_network_device(mac_address),
            audio: create_audio_device(),
            console: create_console_device(),
            shared_directories: create_shared_directory_devices(
                request.shared_directory.as_deref(),
            ),
        };

        config.validate(&self.host.cpu_limits(), &self.host.memory_limits())?;

        tracing::debug!(
            cpu_count = config.cpu_count,
            memory_size = config.memory_size,
            keyboard = ?config.keyboard,
            pointing = ?config.pointing,
            shares = config.shared_directories.len(),
            "assembled vm configuration"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::host::{FixedHost, PlatformVersion};
    use crate::mount::AUTOMOUNT_TAG;
    use std::path::Path;

    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * MIB;

    fn host(cores: usize, version: Option<PlatformVersion>) -> FixedHost {
        let memory_limits = ResourceLimits::new("memory size", 128 * MIB, 32 * GIB);
        FixedHost {
            cores,
            cpu_limits: ResourceLimits::new("cpu count", 1, 16).unwrap(),
            memory_limits: memory_limits.unwrap(),
            version,
        }
    }

    fn disk_image(dir: &Path) -> PathBuf {
        let path = dir.join("disk.img");
        std::fs::write(&path, vec![0u8; 8192]).unwrap();
        path
    }

    #[test]
    fn test_build_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(8, Some(PlatformVersion::new(14, 1, 0)));
        let defaults = Defaults::default();

        let config = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(disk_image(dir.path())))
            .unwrap();

        assert_eq!(config.cpu_count, 7);
        assert_eq!(config.memory_size, 4 * GIB);
        assert_eq!(config.keyboard, KeyboardDevice::Mac);
        assert_eq!(config.pointing, PointingDevice::MacTrackpad);
        assert_eq!(config.boot_loader, BootLoader::MacOs);
        assert!(!config.disk.read_only);
        assert_eq!(config.graphics.displays, vec![defaults.display]);
        assert_eq!(config.network.mac_address, defaults.mac_address);
        assert!(config.shared_directories.is_empty());
        assert_eq!(config.console.ports.len(), 1);
    }

    #[test]
    fn test_build_on_older_platform_uses_fallback_devices() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(4, Some(PlatformVersion::new(12, 6, 0)));
        let defaults = Defaults::default();

        let config = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(disk_image(dir.path())))
            .unwrap();

        assert_eq!(config.keyboard, KeyboardDevice::Usb);
        assert_eq!(config.pointing, PointingDevice::UsbScreenCoordinate);
    }

    #[test]
    fn test_build_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let share = tempfile::tempdir().unwrap();
        let host = host(8, None);
        let defaults = Defaults::default();
        let mac: MacAddress = "02:11:22:33:44:55".parse().unwrap();

        let request = BuildRequest::new(disk_image(dir.path()))
            .read_only(true)
            .shared_directory(share.path())
            .cpus(64)
            .memory_size(64 * GIB)
            .display(Display::new(2560, 1600, 110))
            .mac_address(mac);
        let config = ConfigurationBuilder::new(&host, &defaults)
            .build(request)
            .unwrap();

        // Overrides still pass through the clamps
        assert_eq!(config.cpu_count, 16);
        assert_eq!(config.memory_size, 32 * GIB);
        assert!(config.disk.read_only);
        assert_eq!(
            config.graphics.displays,
            vec![Display::new(2560, 1600, 110)]
        );
        assert_eq!(config.network.mac_address, mac);
        assert_eq!(config.shared_directories.len(), 1);
        assert_eq!(config.shared_directories[0].tag, AUTOMOUNT_TAG);
    }

    #[test]
    fn test_missing_shared_directory_does_not_block_build() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(2, None);
        let defaults = Defaults::default();

        let request = BuildRequest::new(disk_image(dir.path()))
            .shared_directory(dir.path().join("no-such-dir"));
        let config = ConfigurationBuilder::new(&host, &defaults)
            .build(request)
            .unwrap();

        assert!(config.shared_directories.is_empty());
    }

    #[test]
    fn test_missing_disk_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(2, None);
        let defaults = Defaults::default();

        let err = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(dir.path().join("missing.img")))
            .unwrap_err();
        assert!(err.is_fatal_precondition());
    }

    #[test]
    fn test_multicast_mac_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(2, None);
        let defaults = Defaults::default();
        let multicast = MacAddress::new([0x01, 0, 0, 0, 0, 1]);

        let err = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(disk_image(dir.path())).mac_address(multicast))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMacAddress { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(2, None);
        let defaults = Defaults::default();
        let mut config = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(disk_image(dir.path())))
            .unwrap();

        config.cpu_count = 0;
        let err = config
            .validate(&host.cpu_limits(), &host.memory_limits())
            .unwrap_err();
        assert!(matches!(err, Error::ResourceOutOfRange { .. }));
    }

    #[test]
    fn test_configuration_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(4, Some(PlatformVersion::new(14, 0, 0)));
        let defaults = Defaults::default();
        let config = ConfigurationBuilder::new(&host, &defaults)
            .build(BuildRequest::new(disk_image(dir.path())))
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"cpu_count\":3"));
        assert!(json.contains("com.redhat.spice.0"));

        let back: VmConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

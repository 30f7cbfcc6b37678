//! Host capability queries.
//!
//! The sizing policy never talks to the operating system directly. It reads
//! core counts, platform limits and the platform version through
//! [`HostCapabilities`], so the same policy runs against the live host
//! ([`SystemHost`]) or a pinned description of one ([`FixedHost`]).

use crate::error::{Error, Result};
use crate::vm::limits::ResourceLimits;
use std::fmt;
use std::str::FromStr;

/// Fewest vCPUs the platform accepts.
pub const PLATFORM_MIN_CPU_COUNT: u32 = 1;

/// Most vCPUs the platform accepts.
pub const PLATFORM_MAX_CPU_COUNT: u32 = 64;

/// Smallest guest memory size the platform accepts (128 MiB).
pub const PLATFORM_MIN_MEMORY_SIZE: u64 = 128 * 1024 * 1024;

/// Memory ceiling used when physical memory cannot be determined (16 GiB).
const FALLBACK_MAX_MEMORY_SIZE: u64 = 16 * 1024 * 1024 * 1024;

/// Operating system version of the host, e.g. `14.2.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version (0 when omitted).
    pub patch: u32,
}

impl PlatformVersion {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Check whether this version is at least `minimum`.
    pub fn at_least(&self, minimum: PlatformVersion) -> bool {
        *self >= minimum
    }
}

impl FromStr for PlatformVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('.').collect();
        if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidPlatformVersion(format!(
                "'{}': expected MAJOR[.MINOR[.PATCH]]",
                s
            )));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse::<u32>().map_err(|_| {
                Error::InvalidPlatformVersion(format!("'{}': '{}' is not a number", s, part))
            })?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What the host offers to a guest.
pub trait HostCapabilities {
    /// Number of logical CPU cores on the host.
    fn logical_cpu_count(&self) -> usize;

    /// vCPU range the platform accepts.
    fn cpu_limits(&self) -> ResourceLimits<u32>;

    /// Guest memory range in bytes the platform accepts.
    fn memory_limits(&self) -> ResourceLimits<u64>;

    /// Host platform version, if it can be determined.
    fn platform_version(&self) -> Option<PlatformVersion>;
}

/// Capabilities of the machine this process runs on.
#[derive(Debug, Clone)]
pub struct SystemHost {
    cores: usize,
    cpu_limits: ResourceLimits<u32>,
    memory_limits: ResourceLimits<u64>,
    version: Option<PlatformVersion>,
}

impl SystemHost {
    /// Query the running host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLimits`] if the host has less physical memory
    /// than the platform minimum.
    pub fn detect() -> Result<Self> {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let max_memory = physical_memory_size().unwrap_or_else(|| {
            tracing::warn!(
                fallback_bytes = FALLBACK_MAX_MEMORY_SIZE,
                "could not determine physical memory, using fallback ceiling"
            );
            FALLBACK_MAX_MEMORY_SIZE
        });

        let host = Self {
            cores,
            cpu_limits: ResourceLimits::new(
                "cpu count",
                PLATFORM_MIN_CPU_COUNT,
                PLATFORM_MAX_CPU_COUNT,
            )?,
            memory_limits: ResourceLimits::new(
                "memory size",
                PLATFORM_MIN_MEMORY_SIZE,
                max_memory,
            )?,
            version: detect_platform_version(),
        };

        tracing::debug!(
            cores = host.cores,
            max_memory,
            version = ?host.version,
            "detected host capabilities"
        );

        Ok(host)
    }
}

impl HostCapabilities for SystemHost {
    fn logical_cpu_count(&self) -> usize {
        self.cores
    }

    fn cpu_limits(&self) -> ResourceLimits<u32> {
        self.cpu_limits
    }

    fn memory_limits(&self) -> ResourceLimits<u64> {
        self.memory_limits
    }

    fn platform_version(&self) -> Option<PlatformVersion> {
        self.version
    }
}

/// A host described by fixed values.
///
/// Useful for reproducible builds of a configuration on a different machine
/// than the one that will run it.
#[derive(Debug, Clone)]
pub struct FixedHost {
    /// Logical core count.
    pub cores: usize,
    /// vCPU limits.
    pub cpu_limits: ResourceLimits<u32>,
    /// Memory limits in bytes.
    pub memory_limits: ResourceLimits<u64>,
    /// Platform version.
    pub version: Option<PlatformVersion>,
}

impl HostCapabilities for FixedHost {
    fn logical_cpu_count(&self) -> usize {
        self.cores
    }

    fn cpu_limits(&self) -> ResourceLimits<u32> {
        self.cpu_limits
    }

    fn memory_limits(&self) -> ResourceLimits<u64> {
        self.memory_limits
    }

    fn platform_version(&self) -> Option<PlatformVersion> {
        self.version
    }
}

/// Total physical memory in bytes.
#[cfg(unix)]
fn physical_memory_size() -> Option<u64> {
    // SAFETY: sysconf has no preconditions and only reads system values.
    let (pages, page_size) = unsafe {
        (
            libc::sysconf(libc::_SC_PHYS_PAGES),
            libc::sysconf(libc::_SC_PAGESIZE),
        )
    };
    if pages <= 0 || page_size <= 0 {
        return None;
    }
    (pages as u64).checked_mul(page_size as u64)
}

#[cfg(not(unix))]
fn physical_memory_size() -> Option<u64> {
    None
}

/// Read the macOS product version via `sw_vers`.
#[cfg(target_os = "macos")]
fn detect_platform_version() -> Option<PlatformVersion> {
    let output = std::process::Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .map_err(|e| tracing::debug!(error = %e, "failed to run sw_vers"))
        .ok()?;
    if !output.status.success() {
        tracing::debug!(status = %output.status, "sw_vers failed");
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .parse()
        .map_err(|e: Error| tracing::debug!(error = %e, "unparseable sw_vers output"))
        .ok()
}

#[cfg(not(target_os = "macos"))]
fn detect_platform_version() -> Option<PlatformVersion> {
    None
}

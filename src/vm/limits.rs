//! Platform resource limits and the sizing policy for CPU and memory.
//!
//! Sizing is a pure function of the host's capabilities: a starting value is
//! chosen by policy and then clamped into the platform's `[minimum, maximum]`
//! range. Clamping is total, so none of these functions can fail.

use crate::config::DEFAULT_MEMORY_SIZE;
use crate::error::{Error, Result};
use std::fmt;

/// Inclusive `[minimum, maximum]` range the platform accepts for a resource.
///
/// Construction guarantees `minimum <= maximum`, which makes [`clamp`](Self::clamp)
/// infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits<T> {
    resource: &'static str,
    minimum: T,
    maximum: T,
}

impl<T> ResourceLimits<T>
where
    T: Copy + Ord + Into<u64>,
{
    /// Create a limits pair for the named resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLimits`] when `minimum > maximum`.
    pub fn new(resource: &'static str, minimum: T, maximum: T) -> Result<Self> {
        if minimum > maximum {
            return Err(Error::InvalidLimits {
                resource,
                minimum: minimum.into(),
                maximum: maximum.into(),
            });
        }
        Ok(Self {
            resource,
            minimum,
            maximum,
        })
    }

    /// Resource name used in diagnostics.
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Smallest accepted value.
    pub fn minimum(&self) -> T {
        self.minimum
    }

    /// Largest accepted value.
    pub fn maximum(&self) -> T {
        self.maximum
    }

    /// Constrain `value` into `[minimum, maximum]`.
    pub fn clamp(&self, value: T) -> T {
        value.clamp(self.minimum, self.maximum)
    }

    /// Check whether `value` lies within the limits.
    pub fn contains(&self, value: T) -> bool {
        self.minimum <= value && value <= self.maximum
    }

    /// Check `value` against the limits, reporting which bound it violates.
    pub fn check(&self, value: T) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(Error::ResourceOutOfRange {
                resource: self.resource,
                value: value.into(),
                minimum: self.minimum.into(),
                maximum: self.maximum.into(),
            })
        }
    }
}

impl<T: fmt::Display> fmt::Display for ResourceLimits<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.minimum, self.maximum)
    }
}

/// Choose the vCPU count for a host with `host_cores` logical cores.
///
/// One core is left to the host when more than one is available. The result
/// is clamped into `limits`.
pub fn compute_cpu_count(host_cores: usize, limits: &ResourceLimits<u32>) -> u32 {
    let wanted = if host_cores <= 1 { 1 } else { host_cores - 1 };
    let wanted = u32::try_from(wanted).unwrap_or(u32::MAX);
    limits.clamp(wanted)
}

/// Choose the guest memory size in bytes from the 4 GiB baseline.
pub fn compute_memory_size(limits: &ResourceLimits<u64>) -> u64 {
    compute_memory_size_from(DEFAULT_MEMORY_SIZE, limits)
}

/// Choose the guest memory size in bytes from an explicit baseline.
pub fn compute_memory_size_from(baseline: u64, limits: &ResourceLimits<u64>) -> u64 {
    limits.clamp(baseline)
}

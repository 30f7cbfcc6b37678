//! Error types for vmassemble.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using vmassemble's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling a VM configuration.
///
/// Disk errors are fatal preconditions: no configuration is produced when the
/// disk image cannot be attached. A missing shared directory is never an
/// error; it is logged and skipped.
#[derive(Error, Debug)]
pub enum Error {
    // Disk errors
    /// Disk image does not exist.
    #[error("disk image not found: {}", path.display())]
    DiskNotFound {
        /// Path to the disk image.
        path: PathBuf,
    },

    /// Disk image exists but cannot be attached.
    #[error("failed to attach disk image {}: {source}", path.display())]
    DiskUnavailable {
        /// Path to the disk image.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// Disk image is in a format the platform cannot attach.
    #[error("unsupported disk format for {}: {format}", path.display())]
    UnsupportedDiskFormat {
        /// Path to the disk image.
        path: PathBuf,
        /// Detected format name.
        format: String,
    },

    // Resource errors
    /// A limits table with minimum above maximum.
    #[error("invalid {resource} limits: minimum {minimum} exceeds maximum {maximum}")]
    InvalidLimits {
        /// Resource kind.
        resource: &'static str,
        /// Lower bound.
        minimum: u64,
        /// Upper bound.
        maximum: u64,
    },

    /// A resource value outside the platform limits.
    #[error("{resource} {value} outside allowed range [{minimum}, {maximum}]")]
    ResourceOutOfRange {
        /// Resource kind.
        resource: &'static str,
        /// Offending value.
        value: u64,
        /// Lower bound.
        minimum: u64,
        /// Upper bound.
        maximum: u64,
    },

    // Parsing errors
    /// MAC address could not be parsed or is not usable.
    #[error("invalid MAC address '{value}': {reason}")]
    InvalidMacAddress {
        /// Input text.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Platform version string could not be parsed.
    #[error("invalid platform version: {0}")]
    InvalidPlatformVersion(String),

    /// Display specification could not be parsed.
    #[error("invalid display: {0}")]
    InvalidDisplay(String),

    // Configuration errors
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to load configuration.
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Failed to save configuration.
    #[error("failed to save config: {0}")]
    ConfigSave(String),

    // Engine errors
    /// Virtualization engine is not available.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Configuration could not be serialized for hand-off.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),

    // IO errors
    /// IO error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a disk-unavailable error with a message.
    pub fn disk_unavailable(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DiskUnavailable {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.into()),
        }
    }

    /// Create a MAC address error.
    pub fn invalid_mac(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMacAddress {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must abort configuration assembly.
    ///
    /// Only disk attachment failures are fatal preconditions; everything else
    /// is an input or environment error reported to the caller as usual.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(
            self,
            Error::DiskNotFound { .. }
                | Error::DiskUnavailable { .. }
                | Error::UnsupportedDiskFormat { .. }
        )
    }
}

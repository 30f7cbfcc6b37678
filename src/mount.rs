//! Host directory sharing.
//!
//! A single host directory can be shared with the guest through a virtio-fs
//! device carrying the auto-mount tag, which makes the guest mount it without
//! further setup. Sharing is optional: a missing or unusable source is logged
//! and skipped, never an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tag the guest recognizes as "mount this share automatically".
pub const AUTOMOUNT_TAG: &str = "com.apple.virtio-fs.automount";

/// Position of the shared directory in a raw argument vector.
pub const SHARED_DIRECTORY_ARG_INDEX: usize = 1;

/// Virtio-fs device exposing one host directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDirectoryDevice {
    /// Tag the guest uses to identify the share.
    pub tag: String,
    /// Directory on the host.
    pub source: PathBuf,
    /// Whether the guest is denied write access.
    pub read_only: bool,
}

/// Build the shared-directory devices for an optional host directory.
///
/// Returns an empty list, after a warning, when no directory is given or the
/// path is not an existing directory. Otherwise returns exactly one
/// read-write device tagged with [`AUTOMOUNT_TAG`].
pub fn create_shared_directory_devices(source: Option<&Path>) -> Vec<SharedDirectoryDevice> {
    let Some(source) = source else {
        tracing::warn!("no shared directory supplied, directory sharing disabled");
        return Vec::new();
    };

    if !source.is_dir() {
        tracing::warn!(
            path = %source.display(),
            "failed to locate shared directory at {}, ignoring",
            source.display()
        );
        return Vec::new();
    }

    let source = match source.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(
                path = %source.display(),
                error = %e,
                "failed to resolve shared directory at {}, ignoring",
                source.display()
            );
            return Vec::new();
        }
    };

    tracing::debug!(path = %source.display(), tag = AUTOMOUNT_TAG, "sharing host directory");

    vec![SharedDirectoryDevice {
        tag: AUTOMOUNT_TAG.to_string(),
        source,
        read_only: false,
    }]
}

/// Read the shared directory from its positional slot in `args`.
pub fn shared_directory_from_args(args: &[String]) -> Option<PathBuf> {
    args.get(SHARED_DIRECTORY_ARG_INDEX).map(PathBuf::from)
}

/// Build shared-directory devices from a raw argument vector.
///
/// `args[0]` is the program name and `args[1]`, if present, the directory.
pub fn create_shared_directory_devices_from_args(args: &[String]) -> Vec<SharedDirectoryDevice> {
    let source = shared_directory_from_args(args);
    create_shared_directory_devices(source.as_deref())
}

//! Disk image attachment.
//!
//! The guest boots from a single virtio block device backed by a raw disk
//! image on the host. Attaching the image is a fatal precondition: if it
//! cannot be opened, no configuration is produced.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// QCOW2 header magic (`QFI\xfb`).
const QCOW2_MAGIC: [u8; 4] = [b'Q', b'F', b'I', 0xfb];

/// Disk image format for block devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    /// Raw disk image.
    #[default]
    Raw,
}

/// Virtio block device backed by a disk image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskDevice {
    /// Absolute path to the disk image.
    pub path: PathBuf,
    /// Disk format.
    pub format: DiskFormat,
    /// Whether the guest may write to the disk.
    pub read_only: bool,
    /// Image size in bytes at attach time.
    pub size_bytes: u64,
}

/// Attach a disk image as the guest's block device.
///
/// The image is opened with the requested access mode to prove it can be
/// attached, then inspected so that empty images and QCOW2 images are
/// rejected here instead of inside the engine.
///
/// # Errors
///
/// - [`Error::DiskNotFound`] if the image does not exist.
/// - [`Error::DiskUnavailable`] if it cannot be opened, is not a regular
///   file, or is empty.
/// - [`Error::UnsupportedDiskFormat`] if it is a QCOW2 image.
pub fn create_disk_device(path: &Path, read_only: bool) -> Result<DiskDevice> {
    let mut file = open_image(path, read_only)?;

    let metadata = file.metadata().map_err(|e| Error::DiskUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(Error::disk_unavailable(path, "not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(Error::disk_unavailable(path, "image is empty"));
    }

    let mut magic = [0u8; 4];
    if metadata.len() >= magic.len() as u64 {
        file.read_exact(&mut magic)
            .map_err(|e| Error::DiskUnavailable {
                path: path.to_path_buf(),
                source: e,
            })?;
        if magic == QCOW2_MAGIC {
            return Err(Error::UnsupportedDiskFormat {
                path: path.to_path_buf(),
                format: "qcow2".into(),
            });
        }
    }

    let path = path.canonicalize().map_err(|e| Error::DiskUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        size_bytes = metadata.len(),
        read_only,
        "attached disk image"
    );

    Ok(DiskDevice {
        path,
        format: DiskFormat::Raw,
        read_only,
        size_bytes: metadata.len(),
    })
}

/// Open the image with the access the guest will get.
fn open_image(path: &Path, read_only: bool) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(!read_only)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::DiskNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::DiskUnavailable {
                path: path.to_path_buf(),
                source: e,
            },
        })
}

#![forbid(unsafe_code)]

pub mod pcd;
pub mod ply;

pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use ply::{read_ply, write_ply, write_ply_binary};

use pointclouds_core::PointCloud;
use std::io;
use std::path::Path;

/// File formats understood by [`read_point_cloud`] and [`write_point_cloud`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ply,
    Pcd,
}

impl Format {
    /// Pick the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("ply") => Ok(Format::Ply),
            Some("pcd") => Ok(Format::Pcd),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported point cloud format: '{}'", path.display()),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub ascii: bool,
    /// No supported encoding compresses; kept so callers can state intent.
    pub compressed: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            ascii: true,
            compressed: false,
        }
    }
}

pub fn read_point_cloud(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Ply => read_ply(path),
        Format::Pcd => read_pcd(path),
    }
}

pub fn write_point_cloud(
    path: impl AsRef<Path>,
    cloud: &PointCloud,
    options: WriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    match (Format::from_path(path)?, options.ascii) {
        (Format::Ply, true) => write_ply(path, cloud),
        (Format::Ply, false) => write_ply_binary(path, cloud),
        (Format::Pcd, true) => write_pcd(path, cloud),
        (Format::Pcd, false) => write_pcd_binary(path, cloud),
    }
}

#![forbid(unsafe_code)]

pub mod crop;
pub mod voxel_downsample;

pub use crop::{crop_by_aabb, crop_by_bounds};
pub use voxel_downsample::voxel_downsample;

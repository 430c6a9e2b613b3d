#![forbid(unsafe_code)]

mod eigen;
pub mod estimate;

pub use estimate::{estimate_normals_radius, FALLBACK_NORMAL};

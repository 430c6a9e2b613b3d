#![forbid(unsafe_code)]
//! Batch point cloud conversion: read a PLY/PCD file or a directory of them,
//! run an optional clip / voxel downsample / normal estimation / normal
//! orientation pipeline, and write the results.

/// Log through `log` when `verbosity` admits `level`.
macro_rules! log_at {
    ($verbosity:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        if $verbosity.allows(level) {
            log::log!(level, $($arg)+);
        }
    }};
}

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;

pub use batch::{convert_file, run, BatchReport};
pub use config::{parse_direction, ClipConfig, ConvertOptions, PipelineConfig, Verbosity};
pub use error::ConvertError;
pub use pipeline::{run_pipeline, ChangeSummary, Stage, DEFAULT_NORMAL_REFERENCE};

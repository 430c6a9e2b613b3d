//! Resolution of raw command-line options into an immutable pipeline
//! configuration.

use log::{Level, LevelFilter};
use pointclouds_io::WriteOptions;

/// Raw, unvalidated options as they arrive from the command line.
///
/// Every field is optional; absence and zero are treated alike by
/// [`PipelineConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    pub clip_x_min: Option<f32>,
    pub clip_x_max: Option<f32>,
    pub clip_y_min: Option<f32>,
    pub clip_y_max: Option<f32>,
    pub clip_z_min: Option<f32>,
    pub clip_z_max: Option<f32>,
    pub voxel_size: Option<f32>,
    pub normal_radius: Option<f32>,
    pub orient_direction: Option<String>,
    pub verbosity: Option<u8>,
}

/// Inclusive axis-aligned box used by the clip stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipConfig {
    pub min_bound: [f32; 3],
    pub max_bound: [f32; 3],
}

/// Diagnostic level 0 (errors only) to 4 (everything).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(u8);

impl Verbosity {
    pub const MAX: u8 = 4;

    /// Values above [`Verbosity::MAX`] clamp to it.
    pub fn new(level: u8) -> Self {
        Self(level.min(Self::MAX))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn level_filter(self) -> LevelFilter {
        match self.0 {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Whether a message at `level` should be emitted.
    pub fn allows(self, level: Level) -> bool {
        level <= self.level_filter()
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self(2)
    }
}

/// Stage parameters for one invocation, shared read-only by every file of a
/// batch. A `None` stage is skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub clip: Option<ClipConfig>,
    pub voxel_size: Option<f32>,
    pub normal_radius: Option<f32>,
    pub orient_direction: Option<[f32; 3]>,
    pub verbosity: Verbosity,
    /// Encoding for every written file; ascii and uncompressed by default.
    pub write: WriteOptions,
}

impl PipelineConfig {
    pub fn resolve(options: &ConvertOptions) -> Self {
        let verbosity = options.verbosity.map(Verbosity::new).unwrap_or_default();

        let bounds = [
            options.clip_x_min,
            options.clip_y_min,
            options.clip_z_min,
            options.clip_x_max,
            options.clip_y_max,
            options.clip_z_max,
        ];
        let clip = bounds.iter().any(Option::is_some).then(|| ClipConfig {
            min_bound: [
                options.clip_x_min.unwrap_or(f32::MIN),
                options.clip_y_min.unwrap_or(f32::MIN),
                options.clip_z_min.unwrap_or(f32::MIN),
            ],
            max_bound: [
                options.clip_x_max.unwrap_or(f32::MAX),
                options.clip_y_max.unwrap_or(f32::MAX),
                options.clip_z_max.unwrap_or(f32::MAX),
            ],
        });

        let orient_direction = options.orient_direction.as_deref().and_then(|raw| {
            let parsed = parse_direction(raw);
            if parsed.is_none() {
                log_at!(
                    verbosity,
                    Level::Warn,
                    "Ignoring orient direction '{}': expected three numbers x,y,z",
                    raw
                );
            }
            parsed
        });

        Self {
            clip,
            voxel_size: positive(options.voxel_size, "voxel size", verbosity),
            normal_radius: positive(options.normal_radius, "normal estimation radius", verbosity),
            orient_direction,
            verbosity,
            write: WriteOptions::default(),
        }
    }

    /// True when no stage would run.
    pub fn is_noop(&self) -> bool {
        self.clip.is_none()
            && self.voxel_size.is_none()
            && self.normal_radius.is_none()
            && self.orient_direction.is_none()
    }
}

fn positive(value: Option<f32>, name: &str, verbosity: Verbosity) -> Option<f32> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Some(v),
        Some(v) if !v.is_finite() => {
            log_at!(verbosity, Level::Warn, "Ignoring non-finite {}: {}", name, v);
            None
        }
        _ => None,
    }
}

/// Parse `x,y,z` with optional surrounding `[]` or `()`.
pub fn parse_direction(raw: &str) -> Option<[f32; 3]> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')))
        .unwrap_or(trimmed);

    let components = inner
        .split(',')
        .map(|part| part.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;

    match components.as_slice() {
        &[x, y, z] => Some([x, y, z]),
        _ => None,
    }
}

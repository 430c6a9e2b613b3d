//! Command-line interface for `convert_point_cloud`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::Level;

use crate::batch::run as run_batch;
use crate::config::{ConvertOptions, PipelineConfig, Verbosity};
use crate::error::ConvertError;

#[derive(Parser, Debug)]
#[command(name = "convert_point_cloud")]
#[command(about = "Clip, downsample and estimate normals for a point cloud file or directory", version)]
pub struct Cli {
    /// Input PLY/PCD file, or a directory of them
    source_path: Option<PathBuf>,

    /// Output file, or output directory when the input is a directory
    target_path: Option<PathBuf>,

    /// Diagnostic level, 0 (errors only) to 4 (everything)
    #[arg(long = "verbose", value_name = "LEVEL")]
    verbose: Option<u8>,

    /// Lower x bound of the clip box
    #[arg(long = "clip_x_min", value_name = "VALUE", allow_negative_numbers = true)]
    clip_x_min: Option<f32>,

    /// Upper x bound of the clip box
    #[arg(long = "clip_x_max", value_name = "VALUE", allow_negative_numbers = true)]
    clip_x_max: Option<f32>,

    /// Lower y bound of the clip box
    #[arg(long = "clip_y_min", value_name = "VALUE", allow_negative_numbers = true)]
    clip_y_min: Option<f32>,

    /// Upper y bound of the clip box
    #[arg(long = "clip_y_max", value_name = "VALUE", allow_negative_numbers = true)]
    clip_y_max: Option<f32>,

    /// Lower z bound of the clip box
    #[arg(long = "clip_z_min", value_name = "VALUE", allow_negative_numbers = true)]
    clip_z_min: Option<f32>,

    /// Upper z bound of the clip box
    #[arg(long = "clip_z_max", value_name = "VALUE", allow_negative_numbers = true)]
    clip_z_max: Option<f32>,

    /// Voxel size for downsampling; 0 disables
    #[arg(long = "voxel_sample", value_name = "SIZE", allow_negative_numbers = true)]
    voxel_sample: Option<f32>,

    /// Neighbour search radius for normal estimation; 0 disables
    #[arg(long = "estimate_normals", value_name = "RADIUS", allow_negative_numbers = true)]
    estimate_normals: Option<f32>,

    /// Flip normals to agree with this direction, given as x,y,z
    #[arg(long = "orient_normals", value_name = "X,Y,Z", allow_hyphen_values = true)]
    orient_normals: Option<String>,
}

impl Cli {
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            clip_x_min: self.clip_x_min,
            clip_x_max: self.clip_x_max,
            clip_y_min: self.clip_y_min,
            clip_y_max: self.clip_y_max,
            clip_z_min: self.clip_z_min,
            clip_z_max: self.clip_z_max,
            voxel_size: self.voxel_sample,
            normal_radius: self.estimate_normals,
            orient_direction: self.orient_normals.clone(),
            verbosity: self.verbose,
        }
    }
}

pub fn run() -> ExitCode {
    run_with(Cli::parse())
}

/// Execute a parsed command line and map the outcome onto an exit status.
pub fn run_with(cli: Cli) -> ExitCode {
    let (Some(source), Some(target)) = (cli.source_path.as_deref(), cli.target_path.as_deref())
    else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    // Logging comes first so resolution warnings are visible.
    let verbosity = cli.verbose.map(Verbosity::new).unwrap_or_default();
    let _ = env_logger::Builder::new()
        .filter_level(verbosity.level_filter())
        .format_timestamp_secs()
        .try_init();

    let config = PipelineConfig::resolve(&cli.options());

    match run_batch(source, target, &config) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            log_at!(
                config.verbosity,
                Level::Error,
                "{} of {} file(s) failed to convert",
                report.failed.len(),
                report.failed.len() + report.converted.len()
            );
            ExitCode::FAILURE
        }
        Err(ConvertError::InputNotFound(_)) => ExitCode::FAILURE,
        Err(e) => {
            log_at!(config.verbosity, Level::Error, "{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointclouds_core::PointCloud;
    use pointclouds_io::{write_point_cloud, WriteOptions};

    fn status(code: ExitCode) -> String {
        format!("{:?}", code)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("convert_point_cloud").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn underscore_flags_map_onto_options() {
        let cli = Cli::try_parse_from([
            "convert_point_cloud",
            "in.ply",
            "out.ply",
            "--clip_x_min",
            "-1.5",
            "--clip_z_max",
            "2",
            "--voxel_sample",
            "0.05",
            "--estimate_normals",
            "0.1",
            "--orient_normals",
            "-1,0,0",
            "--verbose",
            "3",
        ])
        .unwrap();

        let options = cli.options();
        assert_eq!(options.clip_x_min, Some(-1.5));
        assert_eq!(options.clip_z_max, Some(2.0));
        assert_eq!(options.clip_y_min, None);
        assert_eq!(options.voxel_size, Some(0.05));
        assert_eq!(options.normal_radius, Some(0.1));
        assert_eq!(options.orient_direction.as_deref(), Some("-1,0,0"));
        assert_eq!(options.verbosity, Some(3));

        let config = PipelineConfig::resolve(&options);
        assert_eq!(config.orient_direction, Some([-1.0, 0.0, 0.0]));
        assert_eq!(config.verbosity.level(), 3);
    }

    #[test]
    fn positionals_are_optional() {
        let cli = Cli::try_parse_from(["convert_point_cloud"]).unwrap();
        assert!(cli.source_path.is_none());
        assert!(cli.target_path.is_none());
    }

    #[test]
    fn help_without_positionals_exits_successfully() {
        assert_eq!(status(run_with(parse(&[]))), status(ExitCode::SUCCESS));
        assert_eq!(status(run_with(parse(&["only_source.ply"]))), status(ExitCode::SUCCESS));
    }

    #[test]
    fn missing_input_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.ply");
        let target = dir.path().join("out.ply");
        let code = run_with(parse(&[source.to_str().unwrap(), target.to_str().unwrap()]));
        assert_eq!(status(code), status(ExitCode::FAILURE));
        assert!(!target.exists());
    }

    #[test]
    fn successful_batch_exits_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir(&input).unwrap();
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0, 2.0], vec![0.0; 3], vec![0.0; 3]);
        write_point_cloud(input.join("a.ply"), &cloud, WriteOptions::default()).unwrap();

        let code = run_with(parse(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--clip_x_max",
            "1",
        ]));
        assert_eq!(status(code), status(ExitCode::SUCCESS));
        assert!(output.join("a.ply").exists());
    }

    #[test]
    fn batch_with_a_failed_file_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("broken.ply"), "not a ply file").unwrap();

        let code = run_with(parse(&[input.to_str().unwrap(), output.to_str().unwrap()]));
        assert_eq!(status(code), status(ExitCode::FAILURE));
    }
}

//! File and directory drivers around [`run_pipeline`].

use std::fs;
use std::path::{Path, PathBuf};

use log::Level;
use pointclouds_io::{read_point_cloud, write_point_cloud};

use crate::config::PipelineConfig;
use crate::error::ConvertError;
use crate::pipeline::{run_pipeline, ChangeSummary};

/// Outcome of [`run`]: one entry per input file that was attempted.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<(PathBuf, ChangeSummary)>,
    pub failed: Vec<(PathBuf, ConvertError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert `input` to `output`.
///
/// A file is converted straight to `output`. A directory has every regular
/// file directly inside it converted into `output/<file name>`, creating
/// `output` first. Files are processed in name order; a failing file is
/// recorded in the report and the rest still run.
pub fn run(input: &Path, output: &Path, config: &PipelineConfig) -> Result<BatchReport, ConvertError> {
    let mut report = BatchReport::default();
    if config.is_noop() {
        log_at!(
            config.verbosity,
            Level::Debug,
            "No stages configured; inputs are rewritten unchanged"
        );
    }

    if input.is_file() {
        record(&mut report, input, convert_file(input, output, config), config);
    } else if input.is_dir() {
        fs::create_dir_all(output).map_err(|source| ConvertError::CreateDirectory {
            path: output.to_path_buf(),
            source,
        })?;

        for entry in list_files(input)? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            let target = output.join(name);
            let result = convert_file(&entry, &target, config);
            record(&mut report, &entry, result, config);
        }
    } else {
        log_at!(config.verbosity, Level::Error, "File or directory does not exist.");
        return Err(ConvertError::InputNotFound(input.to_path_buf()));
    }

    Ok(report)
}

/// Load one file, run the pipeline and write the result.
pub fn convert_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<ChangeSummary, ConvertError> {
    let cloud = read_point_cloud(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let (cloud, summary) = run_pipeline(cloud, config);
    if summary.processed {
        log_at!(
            config.verbosity,
            Level::Info,
            "Processed point cloud from {} points to {} points.",
            summary.points_in,
            summary.points_out
        );
    }

    if config.write.compressed {
        log_at!(
            config.verbosity,
            Level::Warn,
            "Compression is not supported; writing '{}' uncompressed",
            output.display()
        );
    }
    write_point_cloud(output, &cloud, config.write).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(summary)
}

/// Regular files directly inside `dir`, sorted by path.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let list_err = |source| ConvertError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn record(
    report: &mut BatchReport,
    input: &Path,
    result: Result<ChangeSummary, ConvertError>,
    config: &PipelineConfig,
) {
    match result {
        Ok(summary) => report.converted.push((input.to_path_buf(), summary)),
        Err(e) => {
            log_at!(config.verbosity, Level::Error, "{}", e);
            report.failed.push((input.to_path_buf(), e));
        }
    }
}

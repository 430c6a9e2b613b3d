//! The ordered stage pipeline: clip, voxel downsample, estimate normals,
//! orient normals.

use log::Level;
use pointclouds_core::PointCloud;
use pointclouds_filters::{crop_by_bounds, voxel_downsample};
use pointclouds_normals::estimate_normals_radius;

use crate::config::PipelineConfig;

/// Orientation reference for freshly estimated normals on a cloud that had
/// none.
pub const DEFAULT_NORMAL_REFERENCE: [f32; 3] = [0.0, 0.0, -1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clip,
    VoxelDownsample,
    EstimateNormals,
    OrientNormals,
}

/// What a pipeline run did to one cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub points_in: usize,
    pub points_out: usize,
    /// Set by clip, voxel downsample and normal estimation. Orientation alone
    /// leaves it unset.
    pub processed: bool,
    /// Stages that executed, in order.
    pub stages: Vec<Stage>,
}

impl ChangeSummary {
    pub fn ran(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Run every configured stage over `cloud` in fixed order.
pub fn run_pipeline(cloud: PointCloud, config: &PipelineConfig) -> (PointCloud, ChangeSummary) {
    let verbosity = config.verbosity;
    let mut summary = ChangeSummary {
        points_in: cloud.len(),
        ..Default::default()
    };
    let mut cloud = cloud;

    if let Some(clip) = &config.clip {
        log_at!(
            verbosity,
            Level::Debug,
            "Clip to min [{:.4}, {:.4}, {:.4}] max [{:.4}, {:.4}, {:.4}]",
            clip.min_bound[0],
            clip.min_bound[1],
            clip.min_bound[2],
            clip.max_bound[0],
            clip.max_bound[1],
            clip.max_bound[2]
        );
        cloud = crop_by_bounds(&cloud, clip.min_bound, clip.max_bound);
        summary.stages.push(Stage::Clip);
        summary.processed = true;
    }

    if let Some(voxel_size) = config.voxel_size {
        log_at!(verbosity, Level::Debug, "Voxel downsample with voxel size {:.4}", voxel_size);
        cloud = voxel_downsample(&cloud, voxel_size);
        summary.stages.push(Stage::VoxelDownsample);
        summary.processed = true;
    }

    if let Some(radius) = config.normal_radius {
        log_at!(verbosity, Level::Debug, "Estimate normals with search radius {:.4}", radius);
        let normals = estimate_normals_radius(&cloud, radius, Some(DEFAULT_NORMAL_REFERENCE));
        cloud.normals = Some(normals);
        summary.stages.push(Stage::EstimateNormals);
        summary.processed = true;
    }

    if let Some(direction) = config.orient_direction {
        if cloud.has_normals() {
            log_at!(
                verbosity,
                Level::Debug,
                "Orient normals toward direction [{:.2}, {:.2}, {:.2}]",
                direction[0],
                direction[1],
                direction[2]
            );
            orient_normals(&mut cloud, direction);
            summary.stages.push(Stage::OrientNormals);
        } else {
            log_at!(verbosity, Level::Debug, "Skipping normal orientation: cloud has no normals");
        }
    }

    summary.points_out = cloud.len();
    (cloud, summary)
}

fn orient_normals(cloud: &mut PointCloud, direction: [f32; 3]) {
    let Some(normals) = cloud.normals.as_mut() else {
        return;
    };
    for i in 0..normals.len() {
        let n = normals.get(i);
        if n[0] * direction[0] + n[1] * direction[1] + n[2] * direction[2] < 0.0 {
            normals.flip(i);
        }
    }
}

use pointclouds_convert::{run_pipeline, ConvertOptions, PipelineConfig};
use pointclouds_core::PointCloud;

fn main() {
    // Synthetic cloud: 1000 scattered points in a 10 x 10 x 10 cube
    let n = 1000;
    let x: Vec<f32> = (0..n).map(|i| (i as f32 * 0.731) % 10.0).collect();
    let y: Vec<f32> = (0..n).map(|i| (i as f32 * 0.419) % 10.0).collect();
    let z: Vec<f32> = (0..n).map(|i| (i as f32 * 0.257) % 10.0).collect();
    let cloud = PointCloud::from_xyz(x, y, z);
    println!("Original cloud: {} points", cloud.len());

    // Same options the command line would build from
    // --clip_x_min 2 --clip_x_max 8 --voxel_sample 1 --estimate_normals 2.5
    let config = PipelineConfig::resolve(&ConvertOptions {
        clip_x_min: Some(2.0),
        clip_x_max: Some(8.0),
        voxel_size: Some(1.0),
        normal_radius: Some(2.5),
        ..Default::default()
    });

    let (processed, summary) = run_pipeline(cloud, &config);
    println!(
        "After {:?}: {} -> {} points",
        summary.stages, summary.points_in, summary.points_out
    );

    let aabb = processed.aabb();
    println!("Bounding box: min={:?}, max={:?}", aabb.min, aabb.max);
    if let Some(normals) = processed.normals.as_ref().filter(|n| !n.is_empty()) {
        println!("First normal: {:?}", normals.get(0));
    }
}

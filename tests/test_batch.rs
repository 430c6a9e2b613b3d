use std::fs;
use std::path::Path;

use pointclouds_convert::{run, ConvertError, ConvertOptions, PipelineConfig};
use pointclouds_core::{Normals, PointCloud};
use pointclouds_io::{read_point_cloud, write_point_cloud, WriteOptions};

fn scatter(n: usize, offset: f32) -> PointCloud {
    PointCloud::from_xyz(
        (0..n).map(|i| offset + (i % 4) as f32 * 0.03).collect(),
        (0..n).map(|i| (i / 4) as f32 * 0.03).collect(),
        (0..n).map(|i| i as f32 * 1e-4).collect(),
    )
}

fn write(path: &Path, cloud: &PointCloud) {
    write_point_cloud(path, cloud, WriteOptions::default()).unwrap();
}

#[test]
fn directory_batch_downsamples_and_estimates_normals() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write(&input.join("a.ply"), &scatter(10, 0.0));
    let mut b = scatter(5, 1.0);
    b.normals = Some((0..5).map(|_| [0.0, 0.0, 1.0]).collect::<Normals>());
    write(&input.join("b.ply"), &b);

    let config = PipelineConfig::resolve(&ConvertOptions {
        voxel_size: Some(0.05),
        normal_radius: Some(0.1),
        ..Default::default()
    });
    let report = run(&input, &output, &config).unwrap();

    assert!(report.is_success());
    assert_eq!(report.converted.len(), 2);

    let a_out = read_point_cloud(output.join("a.ply")).unwrap();
    let b_out = read_point_cloud(output.join("b.ply")).unwrap();
    assert!(a_out.len() <= 10 && !a_out.is_empty());
    assert!(b_out.len() <= 5 && !b_out.is_empty());
    let a_normals = a_out.normals.as_ref().expect("normals were estimated for a.ply");
    let b_normals = b_out.normals.as_ref().expect("normals were estimated for b.ply");
    // No prior normals: oriented toward -z. Prior +z normals keep their sign.
    for n in a_normals.iter() {
        assert!(n[2] < 0.0, "a.ply normal {:?}", n);
    }
    for n in b_normals.iter() {
        assert!(n[2] > 0.0, "b.ply normal {:?}", n);
    }

    for (path, summary) in &report.converted {
        assert!(summary.processed, "{}", path.display());
        assert!(summary.points_out <= summary.points_in);
    }
}

#[test]
fn one_bad_file_is_reported_and_the_rest_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write(&input.join("good_1.pcd"), &scatter(6, 0.0));
    fs::write(input.join("broken.ply"), "ply\nformat ascii 1.0\nend_header\n").unwrap();
    write(&input.join("good_2.ply"), &scatter(3, 2.0));

    let report = run(&input, &output, &PipelineConfig::default()).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.converted.len(), 2);
    assert_eq!(report.failed[0].0.file_name().unwrap(), "broken.ply");
    assert_eq!(read_point_cloud(output.join("good_1.pcd")).unwrap().len(), 6);
    assert_eq!(read_point_cloud(output.join("good_2.ply")).unwrap().len(), 3);
}

#[test]
fn single_file_conversion_changes_format_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cloud.ply");
    let output = dir.path().join("cloud.pcd");
    write(&input, &scatter(4, 0.0));

    let report = run(&input, &output, &PipelineConfig::default()).unwrap();
    assert!(report.is_success());
    assert!(!report.converted[0].1.processed);
    assert_eq!(read_point_cloud(&output).unwrap(), read_point_cloud(&input).unwrap());
}

#[test]
fn missing_input_does_no_work() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");

    let err = run(&dir.path().join("missing"), &output, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::InputNotFound(_)));
    assert!(!output.exists());
}

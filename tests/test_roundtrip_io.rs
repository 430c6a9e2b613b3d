use pointclouds_core::{Colors, Normals, PointCloud};
use pointclouds_io::{read_point_cloud, write_point_cloud, WriteOptions};

fn sample_cloud() -> PointCloud {
    let mut cloud = PointCloud::from_xyz(
        vec![1.0, 2.0, 3.0],
        vec![4.0, 5.0, 6.0],
        vec![7.0, 8.0, 9.0],
    );
    cloud.normals = Some(Normals {
        nx: vec![1.0, 0.0, 0.0],
        ny: vec![0.0, 1.0, 0.0],
        nz: vec![0.0, 0.0, -1.0],
    });
    cloud
}

#[test]
fn ply_carries_normals_and_colors() {
    let dir = tempfile::tempdir().unwrap();
    let mut cloud = sample_cloud();
    cloud.colors = Some(Colors {
        r: vec![255, 0, 10],
        g: vec![0, 128, 20],
        b: vec![7, 0, 30],
    });

    for ascii in [true, false] {
        let path = dir.path().join(if ascii { "ascii.ply" } else { "binary.ply" });
        write_point_cloud(&path, &cloud, WriteOptions { ascii, compressed: false }).unwrap();
        let loaded = read_point_cloud(&path).unwrap();
        assert_eq!(loaded, cloud, "ascii={}", ascii);
    }
}

#[test]
fn pcd_carries_normals() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = sample_cloud();

    for ascii in [true, false] {
        let path = dir.path().join(if ascii { "ascii.pcd" } else { "binary.pcd" });
        write_point_cloud(&path, &cloud, WriteOptions { ascii, compressed: false }).unwrap();
        let loaded = read_point_cloud(&path).unwrap();
        assert_eq!(loaded.x, cloud.x);
        assert_eq!(loaded.y, cloud.y);
        assert_eq!(loaded.z, cloud.z);
        assert_eq!(loaded.normals, cloud.normals, "ascii={}", ascii);
    }
}

#[test]
fn compressed_flag_still_writes_a_readable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.PCD");
    let cloud = sample_cloud();

    write_point_cloud(&path, &cloud, WriteOptions { ascii: true, compressed: true }).unwrap();
    assert_eq!(read_point_cloud(&path).unwrap().len(), 3);
}

#[test]
fn empty_cloud_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["empty.ply", "empty.pcd"] {
        let path = dir.path().join(name);
        write_point_cloud(&path, &PointCloud::new(), WriteOptions::default()).unwrap();
        assert!(read_point_cloud(&path).unwrap().is_empty(), "{}", name);
    }
}

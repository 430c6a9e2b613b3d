use pointclouds_core::{Aabb, PointCloud};

/// Keep the points inside the inclusive box `min..=max` on all three axes.
///
/// Normals and colors follow their points. Points with a non-finite
/// coordinate are always dropped.
pub fn crop_by_bounds(cloud: &PointCloud, min: [f32; 3], max: [f32; 3]) -> PointCloud {
    crop_by_aabb(cloud, &Aabb::from_bounds(min, max))
}

pub fn crop_by_aabb(cloud: &PointCloud, aabb: &Aabb) -> PointCloud {
    if cloud.is_empty() {
        return PointCloud::new();
    }

    let keep: Vec<usize> = cloud
        .iter_points()
        .enumerate()
        .filter(|(_, p)| aabb.contains(p))
        .map(|(i, _)| i)
        .collect();

    cloud.select(&keep)
}

#[cfg(test)]
mod tests {
    use super::crop_by_bounds;
    use pointclouds_core::{Colors, Normals, PointCloud};
    use proptest::prelude::*;

    fn sample_cloud() -> PointCloud {
        PointCloud::from_xyz(
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![10.0, 20.0, 30.0, 40.0, 50.0],
            vec![100.0, 200.0, 300.0, 400.0, 500.0],
        )
    }

    #[test]
    fn crop_single_axis_leaves_others_open() {
        let cloud = sample_cloud();
        let out = crop_by_bounds(&cloud, [2.0, f32::MIN, f32::MIN], [4.0, f32::MAX, f32::MAX]);
        assert_eq!(out.x, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn crop_all_axes() {
        let cloud = sample_cloud();
        let out = crop_by_bounds(&cloud, [1.0, 15.0, 0.0], [5.0, 45.0, 350.0]);
        assert_eq!(out.x, vec![2.0, 3.0]);
    }

    #[test]
    fn crop_keeps_exact_boundaries() {
        let cloud = PointCloud::from_xyz(vec![-1.0, 0.0, 0.5, 1.0, 2.0], vec![0.0; 5], vec![0.0; 5]);
        let out = crop_by_bounds(&cloud, [0.0, f32::MIN, f32::MIN], [1.0, f32::MAX, f32::MAX]);
        assert_eq!(out.x, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn crop_empty_cloud() {
        let out = crop_by_bounds(&PointCloud::new(), [0.0; 3], [1.0; 3]);
        assert!(out.is_empty());
    }

    #[test]
    fn crop_drops_non_finite_points() {
        let cloud = PointCloud::from_xyz(vec![f32::NAN, 0.5, f32::INFINITY], vec![0.0; 3], vec![0.0; 3]);
        let out = crop_by_bounds(&cloud, [f32::MIN; 3], [f32::MAX; 3]);
        assert_eq!(out.x, vec![0.5]);
    }

    #[test]
    fn crop_filters_attributes_in_lockstep() {
        let mut cloud = PointCloud::from_xyz(vec![-1.0, 0.5, 2.0], vec![0.0; 3], vec![0.0; 3]);
        cloud.normals = Some(Normals {
            nx: vec![1.0, 0.0, 0.0],
            ny: vec![0.0, 1.0, 0.0],
            nz: vec![0.0, 0.0, 1.0],
        });
        cloud.colors = Some(Colors {
            r: vec![10, 20, 30],
            g: vec![0; 3],
            b: vec![0; 3],
        });
        let out = crop_by_bounds(&cloud, [0.0, f32::MIN, f32::MIN], [1.0, f32::MAX, f32::MAX]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.normals.as_ref().unwrap().get(0), [0.0, 1.0, 0.0]);
        assert_eq!(out.colors.as_ref().unwrap().r, vec![20]);
    }

    proptest! {
        #[test]
        fn crop_result_within_bounds(
            pts in prop::collection::vec(
                (-100.0f32..100.0f32, -100.0f32..100.0f32, -100.0f32..100.0f32),
                1..500
            ),
            lo in (-50.0f32..0.0f32, -50.0f32..0.0f32, -50.0f32..0.0f32),
            hi in (0.0f32..50.0f32, 0.0f32..50.0f32, 0.0f32..50.0f32),
        ) {
            let mut cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            cloud.normals = Some((0..pts.len()).map(|_| [0.0, 0.0, 1.0]).collect());
            let min = [lo.0, lo.1, lo.2];
            let max = [hi.0, hi.1, hi.2];
            let out = crop_by_bounds(&cloud, min, max);
            for p in out.iter_points() {
                for axis in 0..3 {
                    prop_assert!(p[axis] >= min[axis] && p[axis] <= max[axis]);
                }
            }
            prop_assert_eq!(out.normals.as_ref().map(|n| n.len()), Some(out.len()));
        }
    }
}

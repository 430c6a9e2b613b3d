use crate::eigen::Sym3;
use pointclouds_core::{Normals, PointCloud};
use pointclouds_spatial::KdTree;
use rayon::prelude::*;

/// Normal assigned when a neighbourhood is too small or too isotropic to fit
/// a plane.
pub const FALLBACK_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Fewest neighbours (the query point included) that define a plane.
const MIN_NEIGHBORS: usize = 3;

/// Estimate a unit normal for every point from the neighbours within
/// `radius`, by PCA of the neighbourhood covariance.
///
/// Orientation:
/// - if `cloud` already carries normals, each new normal is flipped to agree
///   with the old one at the same index;
/// - otherwise, if `reference` is given, each normal is flipped so that
///   `dot(normal, reference) >= 0`;
/// - otherwise the solver's sign is kept.
///
/// The result always has `cloud.len()` entries. Points whose neighbourhood
/// holds fewer than three points (including non-finite points and a
/// non-positive radius) get [`FALLBACK_NORMAL`] before orientation.
///
/// The per-point work is parallelised with rayon.
pub fn estimate_normals_radius(
    cloud: &PointCloud,
    radius: f32,
    reference: Option<[f32; 3]>,
) -> Normals {
    if cloud.is_empty() {
        return Normals::with_capacity(0);
    }

    let tree = KdTree::build(cloud);
    let points: Vec<[f32; 3]> = cloud.iter_points().collect();
    let previous = cloud.normals.as_ref().filter(|_| cloud.has_normals());

    let normals: Vec<[f32; 3]> = points
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            let neighbors = tree.radius_search(point, radius);
            let normal = fit_normal(&points, &neighbors);

            let target = match previous {
                Some(prev) => Some(prev.get(i)),
                None => reference,
            };
            match target {
                Some(t) if dot(normal, t) < 0.0 => [-normal[0], -normal[1], -normal[2]],
                _ => normal,
            }
        })
        .collect();

    normals.into_iter().collect()
}

fn fit_normal(points: &[[f32; 3]], neighbors: &[usize]) -> [f32; 3] {
    if neighbors.len() < MIN_NEIGHBORS {
        return FALLBACK_NORMAL;
    }

    let count = neighbors.len() as f64;
    let mut c = [0.0f64; 3];
    for &idx in neighbors {
        for axis in 0..3 {
            c[axis] += points[idx][axis] as f64;
        }
    }
    for v in &mut c {
        *v /= count;
    }

    let mut cov = Sym3::default();
    for &idx in neighbors {
        let dx = points[idx][0] as f64 - c[0];
        let dy = points[idx][1] as f64 - c[1];
        let dz = points[idx][2] as f64 - c[2];
        cov.a00 += dx * dx;
        cov.a01 += dx * dy;
        cov.a02 += dx * dz;
        cov.a11 += dy * dy;
        cov.a12 += dy * dz;
        cov.a22 += dz * dz;
    }

    match cov.smallest_eigenvector() {
        Some(v) => [v[0] as f32, v[1] as f32, v[2] as f32],
        None => FALLBACK_NORMAL,
    }
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

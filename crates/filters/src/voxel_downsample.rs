use hashbrown::HashMap;
use pointclouds_core::{Colors, Normals, PointCloud};

type VoxelKey = (i64, i64, i64);

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    sx: f64,
    sy: f64,
    sz: f64,
    snx: f64,
    sny: f64,
    snz: f64,
    sr: u64,
    sg: u64,
    sb: u64,
    n: usize,
}

/// Replace every occupied cell of a `voxel_size` grid with the centroid of
/// its points.
///
/// The grid is anchored at the origin (cell = `floor(p / voxel_size)`), so
/// running the filter again on its own output with the same size keeps every
/// centroid in its own cell. Normals are averaged and renormalised, colors
/// averaged. Non-finite points are dropped. Output order follows sorted cell
/// keys.
///
/// # Panics
///
/// Panics if `voxel_size` is not finite and positive.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f32) -> PointCloud {
    assert!(
        voxel_size.is_finite() && voxel_size > 0.0,
        "voxel_size must be > 0 and finite"
    );

    if cloud.is_empty() {
        return PointCloud::new();
    }

    let normals = cloud.normals.as_ref().filter(|_| cloud.has_normals());
    let colors = cloud.colors.as_ref().filter(|_| cloud.has_colors());
    let size = voxel_size as f64;

    let mut bins: HashMap<VoxelKey, VoxelAccum> = HashMap::new();

    for i in 0..cloud.len() {
        let px = cloud.x[i];
        let py = cloud.y[i];
        let pz = cloud.z[i];
        if !px.is_finite() || !py.is_finite() || !pz.is_finite() {
            continue;
        }

        let key = (
            (px as f64 / size).floor() as i64,
            (py as f64 / size).floor() as i64,
            (pz as f64 / size).floor() as i64,
        );

        let entry = bins.entry(key).or_default();
        entry.sx += px as f64;
        entry.sy += py as f64;
        entry.sz += pz as f64;
        if let Some(n) = normals {
            entry.snx += n.nx[i] as f64;
            entry.sny += n.ny[i] as f64;
            entry.snz += n.nz[i] as f64;
        }
        if let Some(c) = colors {
            entry.sr += c.r[i] as u64;
            entry.sg += c.g[i] as u64;
            entry.sb += c.b[i] as u64;
        }
        entry.n += 1;
    }

    if bins.is_empty() {
        return PointCloud::new();
    }

    let mut cells: Vec<(VoxelKey, VoxelAccum)> = bins.into_iter().collect();
    cells.sort_unstable_by_key(|(key, _)| *key);

    let mut x = Vec::with_capacity(cells.len());
    let mut y = Vec::with_capacity(cells.len());
    let mut z = Vec::with_capacity(cells.len());
    let mut out_normals = normals.map(|_| Normals::with_capacity(cells.len()));
    let mut out_colors = colors.map(|_| Colors {
        r: Vec::with_capacity(cells.len()),
        g: Vec::with_capacity(cells.len()),
        b: Vec::with_capacity(cells.len()),
    });

    for (_, a) in &cells {
        let denom = a.n as f64;
        x.push((a.sx / denom) as f32);
        y.push((a.sy / denom) as f32);
        z.push((a.sz / denom) as f32);

        if let Some(n) = out_normals.as_mut() {
            n.push(normalized([a.snx, a.sny, a.snz]));
        }
        if let Some(c) = out_colors.as_mut() {
            let avg = |s: u64| ((s as f64 / denom).round()).min(255.0) as u8;
            c.r.push(avg(a.sr));
            c.g.push(avg(a.sg));
            c.b.push(avg(a.sb));
        }
    }

    let mut out = PointCloud::from_xyz(x, y, z);
    out.normals = out_normals;
    out.colors = out_colors;
    out
}

fn normalized(v: [f64; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-12 {
        [(v[0] / len) as f32, (v[1] / len) as f32, (v[2] / len) as f32]
    } else {
        // opposing normals cancelled out
        [0.0, 0.0, 0.0]
    }
}

use crate::Aabb;

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub normals: Option<Normals>,
    pub colors: Option<Colors>,
}

/// Per-point normals stored as three parallel columns.
///
/// When attached to a [`PointCloud`], every column has exactly `cloud.len()`
/// entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    pub nx: Vec<f32>,
    pub ny: Vec<f32>,
    pub nz: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    pub fn from_xyz(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            normals: None,
            colors: None,
        }
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// True when normals are attached and cover every point.
    pub fn has_normals(&self) -> bool {
        self.normals
            .as_ref()
            .is_some_and(|n| !self.is_empty() && n.len() == self.len())
    }

    pub fn has_colors(&self) -> bool {
        self.colors
            .as_ref()
            .is_some_and(|c| !self.is_empty() && c.len() == self.len())
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_xyz(&self.x, &self.y, &self.z)
    }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    /// Build a new cloud from the points at `indices`, carrying normals and
    /// colors along in the same order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut x = Vec::with_capacity(indices.len());
        let mut y = Vec::with_capacity(indices.len());
        let mut z = Vec::with_capacity(indices.len());

        for &idx in indices {
            assert!(idx < self.len(), "index out of bounds in select");
            x.push(self.x[idx]);
            y.push(self.y[idx]);
            z.push(self.z[idx]);
        }

        let normals = self.normals.as_ref().map(|n| Normals {
            nx: indices.iter().map(|&idx| n.nx[idx]).collect(),
            ny: indices.iter().map(|&idx| n.ny[idx]).collect(),
            nz: indices.iter().map(|&idx| n.nz[idx]).collect(),
        });

        let colors = self.colors.as_ref().map(|c| Colors {
            r: indices.iter().map(|&idx| c.r[idx]).collect(),
            g: indices.iter().map(|&idx| c.g[idx]).collect(),
            b: indices.iter().map(|&idx| c.b[idx]).collect(),
        });

        Self {
            x,
            y,
            z,
            normals,
            colors,
        }
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl Normals {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            nx: Vec::with_capacity(n),
            ny: Vec::with_capacity(n),
            nz: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.nx.len(), self.ny.len());
        debug_assert_eq!(self.nx.len(), self.nz.len());
        self.nx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nx.is_empty()
    }

    pub fn get(&self, i: usize) -> [f32; 3] {
        [self.nx[i], self.ny[i], self.nz[i]]
    }

    pub fn push(&mut self, n: [f32; 3]) {
        self.nx.push(n[0]);
        self.ny.push(n[1]);
        self.nz.push(n[2]);
    }

    /// Negate the normal at `i` in place.
    pub fn flip(&mut self, i: usize) {
        self.nx[i] = -self.nx[i];
        self.ny[i] = -self.ny[i];
        self.nz[i] = -self.nz[i];
    }

    pub fn iter(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.nx
            .iter()
            .zip(&self.ny)
            .zip(&self.nz)
            .map(|((x, y), z)| [*x, *y, *z])
    }
}

impl FromIterator<[f32; 3]> for Normals {
    fn from_iter<I: IntoIterator<Item = [f32; 3]>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut normals = Self::with_capacity(iter.size_hint().0);
        for n in iter {
            normals.push(n);
        }
        normals
    }
}

impl Colors {
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.r.len(), self.g.len());
        debug_assert_eq!(self.r.len(), self.b.len());
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

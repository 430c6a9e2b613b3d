use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use pointclouds_core::PointCloud;

/// A KdTree for radius queries on 3D point clouds.
///
/// Built on kiddo v5's `ImmutableKdTree`. Points with a non-finite coordinate
/// are left out of the tree; every index returned by a query refers to the
/// original [`PointCloud`].
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    /// Tree item -> index in the source cloud.
    source_index: Vec<usize>,
}

impl KdTree {
    pub fn build(cloud: &PointCloud) -> Self {
        let mut points: Vec<[f32; 3]> = Vec::with_capacity(cloud.len());
        let mut source_index = Vec::with_capacity(cloud.len());

        for (i, p) in cloud.iter_points().enumerate() {
            if p.iter().all(|v| v.is_finite()) {
                points.push(p);
                source_index.push(i);
            }
        }

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            source_index,
        }
    }

    /// Number of indexed (finite) points.
    pub fn len(&self) -> usize {
        self.source_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_index.is_empty()
    }

    /// Find all points within `radius` (Euclidean distance) of `query`.
    ///
    /// Returns source-cloud indices of points where `dist <= radius`, sorted
    /// ascending.
    ///
    /// Returns empty if radius <= 0, radius is non-finite, the tree is empty,
    /// or the query has a non-finite coordinate.
    pub fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if self.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.iter().all(|v| v.is_finite())
        {
            return Vec::new();
        }

        let radius_sq = radius * radius;

        // kiddo's `within_unsorted` uses strict `<`; widen slightly and
        // post-filter with `<=` so boundary points are kept.
        let query_radius_sq = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let results = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, query_radius_sq);

        let mut indices: Vec<usize> = results
            .into_iter()
            .filter(|nn| nn.distance <= radius_sq)
            .map(|nn| self.source_index[nn.item as usize])
            .collect();

        indices.sort_unstable();
        indices
    }
}

/// Upper triangle of a symmetric 3x3 matrix:
///
/// ```text
/// | a00 a01 a02 |
/// | a01 a11 a12 |
/// | a02 a12 a22 |
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Sym3 {
    pub a00: f64,
    pub a01: f64,
    pub a02: f64,
    pub a11: f64,
    pub a12: f64,
    pub a22: f64,
}

const TINY: f64 = 1e-30;

impl Sym3 {
    /// Unit eigenvector of the smallest eigenvalue, or `None` when the matrix
    /// is (near) a multiple of the identity and no direction is preferred.
    ///
    /// Eigenvalues come from Cardano's closed form for symmetric matrices; the
    /// eigenvector is the cross product of two rows of `A - λI`, which has
    /// rank at most 2. Cheaper than an iterative solver and allocation-free.
    pub fn smallest_eigenvector(&self) -> Option<[f64; 3]> {
        let Sym3 {
            a00,
            a01,
            a02,
            a11,
            a12,
            a22,
        } = *self;

        let m = (a00 + a11 + a22) / 3.0;
        let b00 = a00 - m;
        let b11 = a11 - m;
        let b22 = a22 - m;

        // q = det(A - mI) / 2, p = |A - mI|_F^2 / 6
        let q = (b00 * (b11 * b22 - a12 * a12) - a01 * (a01 * b22 - a12 * a02)
            + a02 * (a01 * a12 - b11 * a02))
            / 2.0;
        let p = ((b00 * b00 + b11 * b11 + b22 * b22 + 2.0 * (a01 * a01 + a02 * a02 + a12 * a12))
            / 6.0)
            .max(0.0);

        if p < TINY {
            return None;
        }

        let phi = (q / (p * p.sqrt())).clamp(-1.0, 1.0).acos() / 3.0;
        // Smallest of the three roots m + 2 sqrt(p) cos(phi + 2k pi / 3).
        let lambda = m + 2.0 * p.sqrt() * (phi + 2.0 * std::f64::consts::FRAC_PI_3).cos();

        let rows = [
            [a00 - lambda, a01, a02],
            [a01, a11 - lambda, a12],
            [a02, a12, a22 - lambda],
        ];

        [(0, 1), (0, 2), (1, 2)].iter().find_map(|&(i, j)| {
            let v = cross(rows[i], rows[j]);
            let len2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
            (len2 >= TINY).then(|| {
                let inv = 1.0 / len2.sqrt();
                [v[0] * inv, v[1] * inv, v[2] * inv]
            })
        })
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::Sym3;
    use approx::assert_abs_diff_eq;

    #[test]
    fn diagonal_matrix_picks_smallest_axis() {
        let m = Sym3 {
            a00: 3.0,
            a11: 2.0,
            a22: 0.5,
            ..Default::default()
        };
        let v = m.smallest_eigenvector().unwrap();
        assert_abs_diff_eq!(v[2].abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn identity_has_no_preferred_direction() {
        let m = Sym3 {
            a00: 1.0,
            a11: 1.0,
            a22: 1.0,
            ..Default::default()
        };
        assert!(m.smallest_eigenvector().is_none());
    }

    #[test]
    fn rotated_plane_covariance() {
        // Spread along (1,1,0)/sqrt2 and z, flat along (1,-1,0)/sqrt2.
        let m = Sym3 {
            a00: 0.5,
            a01: 0.5,
            a11: 0.5,
            a22: 1.0,
            ..Default::default()
        };
        let v = m.smallest_eigenvector().unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!((v[0] * s - v[1] * s).abs(), 1.0, epsilon = 1e-9);
    }
}

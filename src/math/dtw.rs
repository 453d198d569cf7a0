//! Dynamic time warping distance.
//!
//! Paths are projected to 1-D by the Euclidean norm of each point's spatial
//! channels, then aligned with the classic `O(n * m)` recurrence under an
//! absolute-difference cost. Only two rows of the cost matrix are kept.

use crate::math::vector::Vector4;

/// Classic DTW distance between two scalar sequences.
///
/// `D[i][j] = |a[i] - b[j]| + min(D[i-1][j], D[i][j-1], D[i-1][j-1])`, with the
/// first row and column holding cumulative sums. Returns 0 if either input is
/// empty.
#[must_use]
pub fn dtw_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // prev[j] holds D[i-1][j]; seeded with the cumulative first row.
    let mut prev: Vec<f64> = b
        .iter()
        .scan(0.0, |acc, &bj| {
            *acc += (a[0] - bj).abs();
            Some(*acc)
        })
        .collect();
    let mut curr = vec![0.0; b.len()];

    for &ai in &a[1..] {
        curr[0] = prev[0] + (ai - b[0]).abs();
        for j in 1..b.len() {
            let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
            curr[j] = (ai - b[j]).abs() + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len() - 1]
}

/// Project a path to the spatial norm of each point.
#[must_use]
pub fn project_path(path: &[Vector4]) -> Vec<f64> {
    path.iter().map(|p| p.spatial().norm()).collect()
}

/// DTW distance between two motion paths after spatial-norm projection.
#[must_use]
pub fn path_dtw_distance(a: &[Vector4], b: &[Vector4]) -> f64 {
    dtw_distance(&project_path(a), &project_path(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Full-matrix reference implementation.
    fn dtw_full(a: &[f64], b: &[f64]) -> f64 {
        let (n, m) = (a.len(), b.len());
        let mut d = vec![vec![0.0_f64; m]; n];
        for i in 0..n {
            for j in 0..m {
                let cost = (a[i] - b[j]).abs();
                d[i][j] = cost
                    + match (i, j) {
                        (0, 0) => 0.0,
                        (0, _) => d[0][j - 1],
                        (_, 0) => d[i - 1][0],
                        _ => d[i - 1][j].min(d[i][j - 1]).min(d[i - 1][j - 1]),
                    };
            }
        }
        d[n - 1][m - 1]
    }

    #[test]
    fn test_identical_sequences_zero() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(dtw_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_time_warped_sequences_zero() {
        // Repeating samples is absorbed by the warp.
        let a = [0.0, 1.0, 2.0, 3.0];
        let b = [0.0, 0.0, 1.0, 1.0, 2.0, 3.0, 3.0];
        assert_relative_eq!(dtw_distance(&a, &b), 0.0);
    }

    #[test]
    fn test_constant_offset() {
        let a = [1.0, 1.0, 1.0];
        let b = [2.0, 2.0, 2.0];
        assert_relative_eq!(dtw_distance(&a, &b), 3.0);
    }

    #[test]
    fn test_single_points() {
        assert_relative_eq!(dtw_distance(&[2.0], &[5.0]), 3.0);
        // Boundary column is the cumulative sum.
        assert_relative_eq!(dtw_distance(&[0.0], &[1.0, 2.0, 3.0]), 6.0);
    }

    #[test]
    fn test_matches_full_matrix() {
        let a = [0.3, 1.7, 2.2, 0.9, -0.4, 1.1];
        let b = [0.1, 1.2, 2.9, 2.0, 0.2];
        assert_relative_eq!(dtw_distance(&a, &b), dtw_full(&a, &b), epsilon = 1e-12);
        assert_relative_eq!(dtw_distance(&b, &a), dtw_full(&b, &a), epsilon = 1e-12);
    }

    #[test]
    fn test_symmetry() {
        let a = [0.0, 2.0, 4.0, 3.0];
        let b = [1.0, 3.0, 3.5];
        assert_relative_eq!(dtw_distance(&a, &b), dtw_distance(&b, &a), epsilon = 1e-12);
    }

    #[test]
    fn test_empty() {
        assert_eq!(dtw_distance(&[], &[1.0]), 0.0);
        assert_eq!(dtw_distance(&[1.0], &[]), 0.0);
    }

    #[test]
    fn test_path_projection_ignores_height() {
        let a = [Vector4::new(3.0, 4.0, 0.0, 100.0), Vector4::new(0.0, 0.0, 1.0, -7.0)];
        assert_eq!(project_path(&a), vec![5.0, 1.0]);

        let b = [Vector4::new(0.0, 5.0, 0.0, 0.0), Vector4::new(1.0, 0.0, 0.0, 0.0)];
        assert_relative_eq!(path_dtw_distance(&a, &b), 0.0);
    }
}

//! In-place Gaussian elimination with partial row pivoting.

use crate::lu::{FactorConfig, LuError, LuFactors, LuResult};
use crate::matrix::{self, Matrix};

/// Store the column-`p` multipliers in place, walking `i` from the bottom
/// up: after the pivot scan the tail rows are the warm ones. An entry
/// already within tolerance of zero is stored as exactly `0.0` so the
/// trailing update can skip its row.
fn calc_multipliers(lu: &mut Matrix, p: usize, tol: f64) {
    let pivot = lu.at(p, p);
    for i in (p + 1..lu.size()).rev() {
        let v = lu.at(i, p);
        if v.abs() > tol {
            *lu.at_mut(i, p) = v / pivot;
        } else {
            *lu.at_mut(i, p) = 0.0;
        }
    }
}

/// Factor `a` into `lu` with partial pivoting: on success `perm·a = l·u`
/// with L unit-lower (implicit diagonal) below the diagonal of `lu` and U
/// on and above it, and `perm[k]` the original row in position `k`.
///
/// Returns the number of row transpositions performed. On failure the
/// contents of `lu` and `perm` are unspecified.
pub fn eliminate(
    a: &Matrix,
    lu: &mut Matrix,
    perm: &mut [usize],
    config: &FactorConfig,
) -> LuResult<usize> {
    let n = a.size();
    if lu.size() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: lu.size(),
        });
    }
    if perm.len() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: perm.len(),
        });
    }
    let config = config.validated();

    matrix::set_from(lu, a);
    for (k, p) in perm.iter_mut().enumerate() {
        *p = k;
    }

    let mut swaps = 0;
    for p in 0..n {
        // largest-magnitude candidate below the diagonal; ties keep the
        // earliest row
        let mut max_row = p;
        for i in p + 1..n {
            if lu.at(i, p).abs() > lu.at(max_row, p).abs() {
                max_row = i;
            }
        }
        if max_row != p {
            matrix::swap_rows(lu, p, max_row);
            perm.swap(p, max_row);
            swaps += 1;
        }

        if lu.at(p, p).abs() <= config.pivot_tol {
            return Err(LuError::SingularPivot { col: p });
        }

        calc_multipliers(lu, p, config.pivot_tol);

        for i in p + 1..n {
            let m = lu.at(i, p);
            // zero multiplier leaves the row untouched
            if m != 0.0 {
                lu.axpy_row(i, p, m, p + 1);
            }
        }
    }
    Ok(swaps)
}

/// Allocating wrapper around [`eliminate`].
pub fn factor(a: &Matrix, config: &FactorConfig) -> LuResult<LuFactors> {
    let n = a.size();
    let mut lu = Matrix::new(n)?;
    let mut perm = vec![0usize; n];
    let swaps = eliminate(a, &mut lu, &mut perm, config)?;
    Ok(LuFactors { lu, perm, swaps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use crate::rng::XorShift64;

    fn matrix_from_rows(rows: &[&[f64]]) -> Matrix {
        let n = rows.len();
        let mut m = Matrix::new(n).unwrap();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n);
            for (j, &v) in row.iter().enumerate() {
                *m.at_mut(i, j) = v;
            }
        }
        m
    }

    fn inf_norm(a: &Matrix) -> f64 {
        let n = a.size();
        (0..n)
            .map(|i| (0..n).map(|j| a.at(i, j).abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// max |(L·U)[i][j] − a[perm[i]][j]|
    fn reconstruction_error(a: &Matrix, f: &LuFactors) -> f64 {
        let n = a.size();
        let mut worst = 0.0f64;
        for i in 0..n {
            for j in 0..n {
                let mut acc = 0.0;
                for k in 0..=i.min(j) {
                    let l = if k == i { 1.0 } else { f.lu.at(i, k) };
                    acc += l * f.lu.at(k, j);
                }
                worst = worst.max((acc - a.at(f.perm[i], j)).abs());
            }
        }
        worst
    }

    #[test]
    fn pivots_to_the_largest_magnitude_row() {
        // step 0 picks 8, step 1 picks the 0.75-magnitude candidate
        let a = matrix_from_rows(&[&[2.0, 1.0, 1.0], &[4.0, 3.0, 3.0], &[8.0, 7.0, 9.0]]);
        let f = factor(&a, &FactorConfig::default()).unwrap();
        assert_eq!(f.perm, vec![2, 0, 1]);
        assert_eq!(f.swaps, 2);

        assert_eq!(f.lu.at(0, 0), 8.0);
        assert_eq!(f.lu.at(0, 1), 7.0);
        assert_eq!(f.lu.at(0, 2), 9.0);
        assert_eq!(f.lu.at(1, 0), 0.25);
        assert_eq!(f.lu.at(1, 1), -0.75);
        assert_eq!(f.lu.at(1, 2), -1.25);
        assert_eq!(f.lu.at(2, 0), 0.5);
        assert!((f.lu.at(2, 1) - 2.0 / 3.0).abs() < 1e-15);
        assert!((f.lu.at(2, 2) + 2.0 / 3.0).abs() < 1e-15);

        assert!(reconstruction_error(&a, &f) <= 1e-12);
    }

    #[test]
    fn one_by_one() {
        let a = matrix_from_rows(&[&[5.0]]);
        let f = factor(&a, &FactorConfig::default()).unwrap();
        assert_eq!(f.perm, vec![0]);
        assert_eq!(f.swaps, 0);
        assert_eq!(f.lu.at(0, 0), 5.0);
    }

    #[test]
    fn permutation_matrix_needs_one_swap() {
        let a = matrix_from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]);
        let f = factor(&a, &FactorConfig::default()).unwrap();
        assert_eq!(f.perm, vec![1, 0]);
        assert_eq!(f.swaps, 1);
        // L = I (strict lower is zero), U = I
        assert_eq!(f.lu.at(1, 0), 0.0);
        assert_eq!(f.lu.at(0, 0), 1.0);
        assert_eq!(f.lu.at(1, 1), 1.0);
        assert_eq!(f.lu.at(0, 1), 0.0);
    }

    #[test]
    fn identity_stays_identity() {
        let n = 4;
        let mut a = Matrix::new(n).unwrap();
        matrix::identity(&mut a);
        let f = factor(&a, &FactorConfig::default()).unwrap();
        assert_eq!(f.perm, vec![0, 1, 2, 3]);
        assert_eq!(f.swaps, 0);
        for i in 0..n {
            for j in 0..n {
                assert_eq!(f.lu.at(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = matrix_from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        let err = factor(&a, &FactorConfig::default()).unwrap_err();
        assert!(matches!(err, LuError::SingularPivot { col: 1 }));
    }

    #[test]
    fn dimension_mismatch_is_checked_at_entry() {
        let a = Matrix::new(3).unwrap();
        let mut lu = Matrix::new(4).unwrap();
        let mut perm = vec![0usize; 3];
        let err = eliminate(&a, &mut lu, &mut perm, &FactorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            LuError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        ));

        let mut lu = Matrix::new(3).unwrap();
        let mut short = vec![0usize; 2];
        let err = eliminate(&a, &mut lu, &mut short, &FactorConfig::default()).unwrap_err();
        assert!(matches!(err, LuError::DimensionMismatch { .. }));
    }

    #[test]
    fn invalid_tolerance_is_clamped() {
        let a = matrix_from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]);
        let config = FactorConfig {
            pivot_tol: f64::NAN,
        };
        assert!(factor(&a, &config).is_ok());
    }

    #[test]
    fn reconstruction_over_random_matrices() {
        for n in [1, 2, 3, 5, 8, 13, 16, 33, 64] {
            let mut a = Matrix::new(n).unwrap();
            let mut rng = XorShift64::new(0xC0FFEE ^ n as u64);
            matrix::random_fill(&mut a, &mut rng);
            // diagonal dominance keeps the fixtures well away from singular
            for i in 0..n {
                *a.at_mut(i, i) += n as f64;
            }
            let f = factor(&a, &FactorConfig::default()).unwrap();
            let bound = 1e-9 * inf_norm(&a);
            let err = reconstruction_error(&a, &f);
            assert!(err <= bound, "n = {n}: {err} > {bound}");
        }
    }

    #[test]
    fn zero_column_entries_keep_exact_zero_multipliers() {
        // column 0 below the pivot is exactly zero; multipliers must stay 0.0
        let a = matrix_from_rows(&[&[4.0, 1.0, 2.0], &[0.0, 3.0, 1.0], &[0.0, 1.0, 5.0]]);
        let f = factor(&a, &FactorConfig::default()).unwrap();
        assert_eq!(f.perm, vec![0, 1, 2]);
        assert_eq!(f.lu.at(1, 0), 0.0);
        assert_eq!(f.lu.at(2, 0), 0.0);
        // rows 1..2 untouched by the step-0 update
        assert_eq!(f.lu.at(1, 1), 3.0);
        assert_eq!(f.lu.at(1, 2), 1.0);
    }
}

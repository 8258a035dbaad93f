//! Packed triangular storage for LU factors.
//!
//! Each row stores only its triangle, preceded by a per-row pad chosen so
//! that successive rows' cache-line boundaries fall at staggered offsets
//! when the substitution kernel walks several rows interleaved. The pad
//! arithmetic is pure index math; no padding map is materialized.

use crate::layout::LINE_D;
use crate::matrix::DenseAccess;
use crate::matrix::dense::Matrix;
use crate::matrix::error::MatrixError;
use crate::varray::AlignedBuf;

/// Pad contributed by the whole line-groups of rows before row `i`.
/// `i` may be negative for the shifted upper layout.
fn line_group_pad(i: i64) -> i64 {
    let line = LINE_D as i64;
    i.div_euclid(line) * (line * (line - 1)) / 2
}

/// Read view of a triangular coefficient matrix, as consumed by the
/// substitution kernel. Implemented by the packed storages and by the
/// dense LU-in-one-matrix view.
pub trait Triangular {
    fn size(&self) -> usize;
    fn at(&self, i: usize, j: usize) -> f64;
}

/// Packed lower triangle. Row `i` stores columns `0..=i`; the unit
/// diagonal convention is the substitution kernel's, not the storage's,
/// so the diagonal cell exists but solvers may ignore it.
#[derive(Debug, Clone)]
pub struct TriLower {
    buf: AlignedBuf,
    n: usize,
}

impl TriLower {
    fn pad_before(i: usize) -> usize {
        let line = LINE_D as i64;
        let pos = (i as i64).rem_euclid(line);
        let run = pos * (2 * line - 1 - pos) / 2;
        (line_group_pad(i as i64) + run) as usize
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n && j <= i);
        i * (i + 1) / 2 + j + Self::pad_before(i)
    }

    pub fn new(n: usize) -> Result<Self, MatrixError> {
        if n == 0 {
            return Err(MatrixError::ZeroSize);
        }
        let len = (n - 1) * n / 2 + (n - 1) + Self::pad_before(n - 1) + 1;
        Ok(Self {
            buf: AlignedBuf::alloc(len)?,
            n,
        })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.buf.at(self.offset(i, j))
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let k = self.offset(i, j);
        self.buf.at_mut(k)
    }

    /// Copy the lower triangle (diagonal included) of a dense matrix.
    pub fn set_from<M: DenseAccess>(&mut self, m: &M) {
        debug_assert_eq!(self.n, m.size());
        for i in 0..self.n {
            for j in 0..=i {
                *self.at_mut(i, j) = m.at(i, j);
            }
        }
    }
}

impl Triangular for TriLower {
    fn size(&self) -> usize {
        self.n
    }
    fn at(&self, i: usize, j: usize) -> f64 {
        TriLower::at(self, i, j)
    }
}

/// Packed upper triangle. Row `i` stores columns `i..n`. The pad sequence
/// is shifted by `(n + 1) mod LINE_D` so that row-end alignment matches
/// the lower layout's row-start alignment.
#[derive(Debug, Clone)]
pub struct TriUpper {
    buf: AlignedBuf,
    n: usize,
    shift: usize,
    first_pad: usize,
}

impl TriUpper {
    fn pad_run(shift: usize, first_pad: usize, i: usize) -> usize {
        let line = LINE_D as i64;
        let d = i as i64 - shift as i64;
        let pos = d.rem_euclid(line);
        let run = pos * (pos + 1) / 2;
        (first_pad as i64 + line_group_pad(d) + run) as usize
    }

    fn pad_before(&self, i: usize) -> usize {
        Self::pad_run(self.shift, self.first_pad, i)
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n && j >= i && j < self.n);
        i * (2 * self.n - i + 1) / 2 + (j - i) + self.pad_before(i)
    }

    pub fn new(n: usize) -> Result<Self, MatrixError> {
        if n == 0 {
            return Err(MatrixError::ZeroSize);
        }
        let line = LINE_D as i64;
        let shift = (n + 1) % LINE_D;
        let first_pad = if n % LINE_D != LINE_D - 1 {
            let a1 = line - (n % LINE_D) as i64;
            let an = line - 1;
            let terms = an - a1 + 1;
            (terms * (a1 + an) / 2) as usize
        } else {
            0
        };
        let len = (n - 1) * (n + 2) / 2 + Self::pad_run(shift, first_pad, n - 1) + 1;
        Ok(Self {
            buf: AlignedBuf::alloc(len)?,
            n,
            shift,
            first_pad,
        })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.buf.at(self.offset(i, j))
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let k = self.offset(i, j);
        self.buf.at_mut(k)
    }

    /// Copy the upper triangle (diagonal included) of a dense matrix.
    pub fn set_from<M: DenseAccess>(&mut self, m: &M) {
        debug_assert_eq!(self.n, m.size());
        for i in 0..self.n {
            for j in i..self.n {
                *self.at_mut(i, j) = m.at(i, j);
            }
        }
    }
}

impl Triangular for TriUpper {
    fn size(&self) -> usize {
        self.n
    }
    fn at(&self, i: usize, j: usize) -> f64 {
        TriUpper::at(self, i, j)
    }
}

/// The dense LU-in-one-matrix view: strict lower holds L, diagonal and
/// above hold U. Which triangle is read is the kernel's choice.
impl Triangular for Matrix {
    fn size(&self) -> usize {
        Matrix::size(self)
    }
    fn at(&self, i: usize, j: usize) -> f64 {
        Matrix::at(self, i, j)
    }
}

/// Swap two rows of a factorization held as a packed (L, U) pair, each
/// cell staying in whichever triangle owns it after the swap.
pub fn swap_rows_lu(low: &mut TriLower, upp: &mut TriUpper, row0: usize, row1: usize) {
    if row0 == row1 {
        return;
    }
    let (row0, row1) = if row0 < row1 { (row0, row1) } else { (row1, row0) };
    for j in 0..row0 {
        let a = low.at(row0, j);
        let b = low.at(row1, j);
        *low.at_mut(row0, j) = b;
        *low.at_mut(row1, j) = a;
    }
    for j in row0..row1 {
        let a = upp.at(row0, j);
        let b = low.at(row1, j);
        *upp.at_mut(row0, j) = b;
        *low.at_mut(row1, j) = a;
    }
    for j in row1..upp.size() {
        let a = upp.at(row0, j);
        let b = upp.at(row1, j);
        *upp.at_mut(row0, j) = b;
        *upp.at_mut(row1, j) = a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use crate::rng::XorShift64;
    use std::collections::HashSet;

    #[test]
    fn lower_offsets_are_injective_and_in_bounds() {
        for n in 1..=64 {
            let low = TriLower::new(n).unwrap();
            let mut seen = HashSet::new();
            for i in 0..n {
                for j in 0..=i {
                    let k = low.offset(i, j);
                    assert!(k < low.buf.len(), "n = {n}, ({i}, {j}) -> {k}");
                    assert!(seen.insert(k), "n = {n}: ({i}, {j}) aliases offset {k}");
                }
            }
        }
    }

    #[test]
    fn upper_offsets_are_injective_and_in_bounds() {
        for n in 1..=64 {
            let upp = TriUpper::new(n).unwrap();
            let mut seen = HashSet::new();
            for i in 0..n {
                for j in i..n {
                    let k = upp.offset(i, j);
                    assert!(k < upp.buf.len(), "n = {n}, ({i}, {j}) -> {k}");
                    assert!(seen.insert(k), "n = {n}: ({i}, {j}) aliases offset {k}");
                }
            }
        }
    }

    #[test]
    fn pad_is_non_decreasing_within_a_line_group() {
        // each row's pad grows until the group boundary resets the run
        for i in 0..64usize {
            let pad = TriLower::pad_before(i);
            if i % LINE_D != 0 {
                assert!(pad >= TriLower::pad_before(i - 1));
            }
        }
    }

    #[test]
    fn set_from_round_trips_both_triangles() {
        let n = 13;
        let mut dense = Matrix::new(n).unwrap();
        let mut rng = XorShift64::new(5);
        matrix::random_fill(&mut dense, &mut rng);

        let mut low = TriLower::new(n).unwrap();
        let mut upp = TriUpper::new(n).unwrap();
        low.set_from(&dense);
        upp.set_from(&dense);

        for i in 0..n {
            for j in 0..=i {
                assert_eq!(low.at(i, j), dense.at(i, j));
            }
            for j in i..n {
                assert_eq!(upp.at(i, j), dense.at(i, j));
            }
        }

        let mut rebuilt = Matrix::new(n).unwrap();
        rebuilt.set_from_parts(&low, &upp);
        for i in 0..n {
            for j in 0..n {
                assert_eq!(rebuilt.at(i, j), dense.at(i, j));
            }
        }
    }

    #[test]
    fn paired_swap_matches_dense_swap() {
        let n = 11;
        let mut dense = Matrix::new(n).unwrap();
        let mut rng = XorShift64::new(9);
        matrix::random_fill(&mut dense, &mut rng);

        for (r0, r1) in [(1, 6), (6, 1), (0, n - 1), (4, 5), (3, 3)] {
            let mut low = TriLower::new(n).unwrap();
            let mut upp = TriUpper::new(n).unwrap();
            low.set_from(&dense);
            upp.set_from(&dense);
            swap_rows_lu(&mut low, &mut upp, r0, r1);

            let mut swapped = dense.clone();
            matrix::swap_rows(&mut swapped, r0, r1);

            for i in 0..n {
                for j in 0..i {
                    assert_eq!(low.at(i, j), swapped.at(i, j), "L ({i}, {j})");
                }
                for j in i..n {
                    assert_eq!(upp.at(i, j), swapped.at(i, j), "U ({i}, {j})");
                }
            }
        }
    }
}

//! Dense and packed-triangular matrix storage.

pub mod dense;
pub mod error;
pub mod tri;

pub use dense::{Matrix, MatrixColMajor};
pub use tri::{TriLower, TriUpper, Triangular, swap_rows_lu};

use crate::rng::XorShift64;

/// Element access contract shared by the dense layouts. Callers see
/// `at`/`size` only and never depend on the storage order.
pub trait DenseAccess {
    /// Logical size n.
    fn size(&self) -> usize;
    /// In-memory leading dimension.
    fn size_mem(&self) -> usize;
    fn at(&self, i: usize, j: usize) -> f64;
    fn at_mut(&mut self, i: usize, j: usize) -> &mut f64;
}

/// Swap two logical rows across columns `0..n`. Equal indices are a no-op.
pub fn swap_rows<M: DenseAccess>(m: &mut M, row0: usize, row1: usize) {
    if row0 == row1 {
        return;
    }
    for j in 0..m.size() {
        let a = m.at(row0, j);
        let b = m.at(row1, j);
        *m.at_mut(row0, j) = b;
        *m.at_mut(row1, j) = a;
    }
}

/// `M += sign · B` over the logical region.
pub fn add<M: DenseAccess, B: DenseAccess>(m: &mut M, b: &B, sign: f64) {
    debug_assert_eq!(m.size(), b.size());
    for i in 0..m.size() {
        for j in 0..m.size() {
            *m.at_mut(i, j) += sign * b.at(i, j);
        }
    }
}

/// Copy the logical region of `a` into `m`, whatever either storage order is.
pub fn set_from<M: DenseAccess, A: DenseAccess>(m: &mut M, a: &A) {
    debug_assert_eq!(m.size(), a.size());
    for i in 0..m.size() {
        for j in 0..m.size() {
            *m.at_mut(i, j) = a.at(i, j);
        }
    }
}

/// Set every logical element to `x`.
pub fn set_constant<M: DenseAccess>(m: &mut M, x: f64) {
    for i in 0..m.size() {
        for j in 0..m.size() {
            *m.at_mut(i, j) = x;
        }
    }
}

/// Set `m` to the identity.
pub fn identity<M: DenseAccess>(m: &mut M) {
    for i in 0..m.size() {
        for j in 0..m.size() {
            *m.at_mut(i, j) = 0.0;
        }
        *m.at_mut(i, i) = 1.0;
    }
}

/// Fill the logical region with uniform values in `[0, 1)`.
pub fn random_fill<M: DenseAccess>(m: &mut M, rng: &mut XorShift64) {
    for i in 0..m.size() {
        for j in 0..m.size() {
            *m.at_mut(i, j) = rng.next_f64();
        }
    }
}

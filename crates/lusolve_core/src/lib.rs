//! Dense LU factorization with partial pivoting, and the triangular
//! substitution and inversion routines built on it.
//!
//! The storage layers are cache-aware: dense matrices pad their leading
//! dimension to a friendly multiple of the L1 line, packed triangular
//! factors interleave per-row padding, and every buffer is SIMD-aligned.
//! All kernels are single-threaded and run to completion on the calling
//! thread; errors are returned by value, and accessor bounds are
//! `debug_assert!`ed programmer contracts.

pub mod layout;
pub mod lu;
pub mod matrix;
pub mod rng;
pub mod varray;

pub use lu::{
    Diagonal, Direction, FactorConfig, LuError, LuFactors, LuResult, Permute, eliminate, factor,
    invert, solve, subst,
};
pub use matrix::{DenseAccess, Matrix, MatrixColMajor, TriLower, TriUpper, Triangular};

//! Triangular substitution, blocked for L1 locality, and the solve/invert
//! entry points built from it.
//!
//! The kernel is parameterized over direction, diagonal convention and row
//! permutation. Each of the eight combinations monomorphizes to its own
//! specialized loop; the public [`subst`] dispatches enum parameters onto
//! them.

use crate::layout::BL1;
use crate::lu::factor::factor;
use crate::lu::{FactorConfig, LuError, LuFactors, LuResult};
use crate::matrix::{self, Matrix, MatrixColMajor, Triangular};

/// Row iteration order of the substitution sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forwards,
    Backwards,
}

/// Whether the factor stores its diagonal or carries an implicit unit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    Unit,
    Value,
}

/// Whether right-hand-side rows are read through the pivot permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permute {
    On,
    Off,
}

/// Right-hand-side columns readable by the kernel. A plain slice acts as a
/// one-column matrix and ignores the column index.
pub trait Rhs {
    fn rows(&self) -> usize;
    fn read(&self, i: usize, col: usize) -> f64;
}

/// Solution columns the kernel accumulates into.
pub trait Sol: Rhs {
    fn write(&mut self, i: usize, col: usize, v: f64);
}

impl Rhs for Matrix {
    fn rows(&self) -> usize {
        self.size()
    }
    fn read(&self, i: usize, col: usize) -> f64 {
        self.at(i, col)
    }
}

impl Rhs for MatrixColMajor {
    fn rows(&self) -> usize {
        self.size()
    }
    fn read(&self, i: usize, col: usize) -> f64 {
        self.at(i, col)
    }
}

impl Sol for MatrixColMajor {
    fn write(&mut self, i: usize, col: usize, v: f64) {
        *self.at_mut(i, col) = v;
    }
}

impl Rhs for [f64] {
    fn rows(&self) -> usize {
        self.len()
    }
    fn read(&self, i: usize, _col: usize) -> f64 {
        self[i]
    }
}

impl Sol for [f64] {
    fn write(&mut self, i: usize, _col: usize, v: f64) {
        self[i] = v;
    }
}

#[inline]
fn rhs_value<const PERM: bool, I: Rhs + ?Sized>(rhs: &I, perm: &[usize], i: usize, col: usize) -> f64 {
    if PERM {
        rhs.read(perm[i], col)
    } else {
        rhs.read(i, col)
    }
}

/// Plain row-at-a-time substitution. Iteration indices are signed because
/// the backward sweep runs past zero.
fn subst_unblocked<const FWD: bool, const UNIT: bool, const PERM: bool, T, X, I>(
    t: &T,
    x: &mut X,
    rhs: &I,
    perm: &[usize],
    col: usize,
) -> LuResult<()>
where
    T: Triangular + ?Sized,
    X: Sol + ?Sized,
    I: Rhs + ?Sized,
{
    let n = t.size() as isize;
    let step: isize = if FWD { 1 } else { -1 };

    let mut i = if FWD { 0 } else { n - 1 };
    while i >= 0 && i < n {
        let iu = i as usize;
        let mut acc = rhs_value::<PERM, I>(rhs, perm, iu, col);
        let mut j = if FWD { 0 } else { n - 1 };
        while j != i {
            acc -= t.at(iu, j as usize) * x.read(j as usize, col);
            j += step;
        }
        if !UNIT {
            let d = t.at(iu, iu);
            if d == 0.0 {
                return Err(LuError::SingularDiagonal { row: iu });
            }
            acc /= d;
        }
        x.write(iu, col, acc);
        i += step;
    }
    Ok(())
}

/// `BL1`-tiled substitution. Already-solved tiles are always full, so only
/// the row-range end needs clipping; the diagonal tile clips its column
/// range at `i` and applies the diagonal division last.
fn subst_blocked<const FWD: bool, const UNIT: bool, const PERM: bool, T, X, I>(
    t: &T,
    x: &mut X,
    rhs: &I,
    perm: &[usize],
    col: usize,
) -> LuResult<()>
where
    T: Triangular + ?Sized,
    X: Sol + ?Sized,
    I: Rhs + ?Sized,
{
    let n = t.size() as isize;
    let step: isize = if FWD { 1 } else { -1 };
    let bstep = step * BL1 as isize;

    let mut bi = if FWD { 0 } else { n - 1 };
    while bi >= 0 && bi < n {
        let endi = if FWD {
            (bi + bstep).min(n)
        } else {
            (bi + bstep).max(-1)
        };

        // load this tile's slice of the right-hand side
        let mut i = bi;
        while i != endi {
            let iu = i as usize;
            x.write(iu, col, rhs_value::<PERM, I>(rhs, perm, iu, col));
            i += step;
        }

        // fold in the already-solved tiles
        let mut bj = if FWD { 0 } else { n - 1 };
        while bj != bi {
            let endj = bj + bstep;
            let mut i = bi;
            while i != endi {
                let iu = i as usize;
                let mut acc = x.read(iu, col);
                let mut j = bj;
                while j != endj {
                    acc -= t.at(iu, j as usize) * x.read(j as usize, col);
                    j += step;
                }
                x.write(iu, col, acc);
                i += step;
            }
            bj += bstep;
        }

        // diagonal tile, rows in iteration order
        let mut i = bi;
        while i != endi {
            let iu = i as usize;
            let mut acc = x.read(iu, col);
            let endj = if FWD {
                (bj + bstep).min(i)
            } else {
                (bj + bstep).max(i)
            };
            let mut j = bj;
            while j != endj {
                acc -= t.at(iu, j as usize) * x.read(j as usize, col);
                j += step;
            }
            if !UNIT {
                let d = t.at(iu, iu);
                if d == 0.0 {
                    return Err(LuError::SingularDiagonal { row: iu });
                }
                acc /= d;
            }
            x.write(iu, col, acc);
            i += step;
        }

        bi += bstep;
    }
    Ok(())
}

fn subst_impl<const FWD: bool, const UNIT: bool, const PERM: bool, T, X, I>(
    t: &T,
    x: &mut X,
    rhs: &I,
    perm: &[usize],
    col: usize,
) -> LuResult<()>
where
    T: Triangular + ?Sized,
    X: Sol + ?Sized,
    I: Rhs + ?Sized,
{
    // a single tile gains nothing from tiling
    if t.size() <= BL1 {
        subst_unblocked::<FWD, UNIT, PERM, T, X, I>(t, x, rhs, perm, col)
    } else {
        subst_blocked::<FWD, UNIT, PERM, T, X, I>(t, x, rhs, perm, col)
    }
}

/// Solve one column of `T·X = I` by substitution.
///
/// `t` must be lower triangular for [`Direction::Forwards`] and upper
/// triangular for [`Direction::Backwards`] (a dense LU matrix serves as
/// either view). With [`Permute::On`], row `i` of the right-hand side is
/// read as `rhs[perm[i]]`; `perm` may be empty otherwise.
pub fn subst<T, X, I>(
    direction: Direction,
    diagonal: Diagonal,
    permute: Permute,
    t: &T,
    x: &mut X,
    rhs: &I,
    perm: &[usize],
    col: usize,
) -> LuResult<()>
where
    T: Triangular + ?Sized,
    X: Sol + ?Sized,
    I: Rhs + ?Sized,
{
    let n = t.size();
    if x.rows() < n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: x.rows(),
        });
    }
    if rhs.rows() < n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: rhs.rows(),
        });
    }
    if permute == Permute::On && perm.len() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: perm.len(),
        });
    }

    use Diagonal::{Unit, Value};
    use Direction::{Backwards, Forwards};
    use Permute::{Off, On};
    match (direction, diagonal, permute) {
        (Forwards, Unit, On) => subst_impl::<true, true, true, T, X, I>(t, x, rhs, perm, col),
        (Forwards, Unit, Off) => subst_impl::<true, true, false, T, X, I>(t, x, rhs, perm, col),
        (Forwards, Value, On) => subst_impl::<true, false, true, T, X, I>(t, x, rhs, perm, col),
        (Forwards, Value, Off) => subst_impl::<true, false, false, T, X, I>(t, x, rhs, perm, col),
        (Backwards, Unit, On) => subst_impl::<false, true, true, T, X, I>(t, x, rhs, perm, col),
        (Backwards, Unit, Off) => subst_impl::<false, true, false, T, X, I>(t, x, rhs, perm, col),
        (Backwards, Value, On) => subst_impl::<false, false, true, T, X, I>(t, x, rhs, perm, col),
        (Backwards, Value, Off) => subst_impl::<false, false, false, T, X, I>(t, x, rhs, perm, col),
    }
}

/// Solve `A·x = b` given the factors of `A`.
pub fn solve(factors: &LuFactors, b: &[f64], x: &mut [f64]) -> LuResult<()> {
    let n = factors.lu.size();
    if b.len() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if x.len() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: x.len(),
        });
    }
    let mut y = vec![0.0f64; n];
    subst(
        Direction::Forwards,
        Diagonal::Unit,
        Permute::On,
        &factors.lu,
        y.as_mut_slice(),
        b,
        &factors.perm,
        0,
    )?;
    subst(
        Direction::Backwards,
        Diagonal::Value,
        Permute::Off,
        &factors.lu,
        x,
        y.as_slice(),
        &[],
        0,
    )?;
    Ok(())
}

/// Invert `a` into `ainv`: factor once, then solve the identity columns
/// through the packed factors, forward over L then backward over U.
pub fn invert(a: &Matrix, ainv: &mut MatrixColMajor, config: &FactorConfig) -> LuResult<()> {
    let n = a.size();
    if ainv.size() != n {
        return Err(LuError::DimensionMismatch {
            expected: n,
            actual: ainv.size(),
        });
    }
    let factors = factor(a, config)?;
    let (low, upp) = factors.split_packed()?;

    let mut ident = MatrixColMajor::new(n)?;
    matrix::identity(&mut ident);
    let mut y = MatrixColMajor::new(n)?;

    for col in 0..n {
        subst(
            Direction::Forwards,
            Diagonal::Unit,
            Permute::On,
            &low,
            &mut y,
            &ident,
            &factors.perm,
            col,
        )?;
        subst(
            Direction::Backwards,
            Diagonal::Value,
            Permute::Off,
            &upp,
            ainv,
            &y,
            &[],
            col,
        )?;
    }
    Ok(())
}

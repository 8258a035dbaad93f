use std::fmt;

use crate::layout::{REG_W, padded_dim};
use crate::matrix::DenseAccess;
use crate::matrix::error::MatrixError;
use crate::matrix::tri::{TriLower, TriUpper};
use crate::varray::AlignedBuf;

/// Dense square matrix, row-major.
///
/// Storage is `n_mem × n_mem` with `n_mem = padded_dim(n)`; only the
/// top-left `n × n` region is logically valid, but the padded cells are
/// addressable (and zero) so kernels may run whole lanes past `n`.
#[derive(Clone)]
pub struct Matrix {
    buf: AlignedBuf,
    n: usize,
    n_mem: usize,
}

impl Matrix {
    pub fn new(n: usize) -> Result<Self, MatrixError> {
        if n == 0 {
            return Err(MatrixError::ZeroSize);
        }
        let n_mem = padded_dim(n);
        let buf = AlignedBuf::alloc(n_mem * n_mem)?;
        Ok(Self { buf, n, n_mem })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn size_mem(&self) -> usize {
        self.n_mem
    }

    pub fn pad(&self) -> usize {
        self.n_mem - self.n
    }

    /// Lane groups per in-memory row.
    pub fn lanes_mem(&self) -> usize {
        self.n_mem / REG_W
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n_mem && j < self.n_mem);
        i * self.n_mem + j
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.buf.at(self.idx(i, j))
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let k = self.idx(i, j);
        self.buf.at_mut(k)
    }

    /// Lane group `g` of row `i`, covering columns `[g·REG_W, g·REG_W + REG_W)`.
    #[inline]
    pub fn atv(&self, i: usize, g: usize) -> &[f64] {
        debug_assert!(i < self.n_mem && g < self.lanes_mem());
        self.buf.atv(i * self.lanes_mem() + g)
    }

    #[inline]
    pub fn atv_mut(&mut self, i: usize, g: usize) -> &mut [f64] {
        debug_assert!(i < self.n_mem && g < self.lanes_mem());
        let k = i * self.lanes_mem() + g;
        self.buf.atv_mut(k)
    }

    /// `row_i[k] -= m · row_p[k]` for `k` in `start..n`.
    ///
    /// Scalar up to the next lane boundary, whole lanes through the bulk,
    /// scalar tail.
    pub(crate) fn axpy_row(&mut self, i: usize, p: usize, m: f64, start: usize) {
        debug_assert!(i != p);
        let n = self.n;
        let lane0 = start.next_multiple_of(REG_W);
        let lane1 = n - n % REG_W;

        let scalar_end = if lane0 < lane1 { lane0 } else { n };
        for k in start..scalar_end {
            let v = self.at(i, k) - m * self.at(p, k);
            *self.at_mut(i, k) = v;
        }
        if lane0 < lane1 {
            let mut src = [0.0f64; REG_W];
            for g in lane0 / REG_W..lane1 / REG_W {
                src.copy_from_slice(self.atv(p, g));
                let dst = self.atv_mut(i, g);
                for (d, s) in dst.iter_mut().zip(src) {
                    *d -= m * s;
                }
            }
            for k in lane1..n {
                let v = self.at(i, k) - m * self.at(p, k);
                *self.at_mut(i, k) = v;
            }
        }
    }

    /// Rebuild the logical region from packed factors: strict lower
    /// triangle from `low`, diagonal and above from `upp`.
    pub fn set_from_parts(&mut self, low: &TriLower, upp: &TriUpper) {
        debug_assert_eq!(self.n, low.size());
        debug_assert_eq!(self.n, upp.size());
        for i in 0..self.n {
            for j in 0..i {
                *self.at_mut(i, j) = low.at(i, j);
            }
            for j in i..self.n {
                *self.at_mut(i, j) = upp.at(i, j);
            }
        }
    }
}

impl DenseAccess for Matrix {
    fn size(&self) -> usize {
        self.n
    }
    fn size_mem(&self) -> usize {
        self.n_mem
    }
    fn at(&self, i: usize, j: usize) -> f64 {
        Matrix::at(self, i, j)
    }
    fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        Matrix::at_mut(self, i, j)
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("n", &self.n)
            .field("n_mem", &self.n_mem)
            .finish()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_rows(self, f)
    }
}

/// Dense square matrix, column-major. Differs from [`Matrix`] only in the
/// index function.
#[derive(Clone)]
pub struct MatrixColMajor {
    buf: AlignedBuf,
    n: usize,
    n_mem: usize,
}

impl MatrixColMajor {
    pub fn new(n: usize) -> Result<Self, MatrixError> {
        if n == 0 {
            return Err(MatrixError::ZeroSize);
        }
        let n_mem = padded_dim(n);
        let buf = AlignedBuf::alloc(n_mem * n_mem)?;
        Ok(Self { buf, n, n_mem })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn size_mem(&self) -> usize {
        self.n_mem
    }

    pub fn pad(&self) -> usize {
        self.n_mem - self.n
    }

    /// Lane groups per in-memory column.
    pub fn lanes_mem(&self) -> usize {
        self.n_mem / REG_W
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n_mem && j < self.n_mem);
        j * self.n_mem + i
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.buf.at(self.idx(i, j))
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let k = self.idx(i, j);
        self.buf.at_mut(k)
    }

    /// Lane group `g` of column `j`, covering rows `[g·REG_W, g·REG_W + REG_W)`.
    #[inline]
    pub fn atv(&self, g: usize, j: usize) -> &[f64] {
        debug_assert!(g < self.lanes_mem() && j < self.n_mem);
        self.buf.atv(j * self.lanes_mem() + g)
    }

    #[inline]
    pub fn atv_mut(&mut self, g: usize, j: usize) -> &mut [f64] {
        debug_assert!(g < self.lanes_mem() && j < self.n_mem);
        let k = j * self.lanes_mem() + g;
        self.buf.atv_mut(k)
    }
}

impl DenseAccess for MatrixColMajor {
    fn size(&self) -> usize {
        self.n
    }
    fn size_mem(&self) -> usize {
        self.n_mem
    }
    fn at(&self, i: usize, j: usize) -> f64 {
        MatrixColMajor::at(self, i, j)
    }
    fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        MatrixColMajor::at_mut(self, i, j)
    }
}

impl fmt::Debug for MatrixColMajor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixColMajor")
            .field("n", &self.n)
            .field("n_mem", &self.n_mem)
            .finish()
    }
}

impl fmt::Display for MatrixColMajor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_rows(self, f)
    }
}

fn fmt_rows<M: DenseAccess>(m: &M, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for i in 0..m.size() {
        for j in 0..m.size() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", m.at(i, j))?;
        }
        writeln!(f)?;
    }
    Ok(())
}

use thiserror::Error;

use crate::matrix::error::MatrixError;

#[derive(Debug, Error)]
pub enum LuError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("no usable pivot in column {col}: matrix is numerically singular")]
    SingularPivot { col: usize },

    #[error("zero diagonal at row {row} during substitution")]
    SingularDiagonal { row: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type LuResult<T> = Result<T, LuError>;

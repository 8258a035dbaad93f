use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("failed to allocate {bytes} bytes of aligned storage")]
    AllocationFailed { bytes: usize },

    #[error("matrix size must be at least 1")]
    ZeroSize,
}

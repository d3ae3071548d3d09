use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
    #[error("response surface length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidSurfaceData { expected_len: usize, actual_len: usize },
    #[error("{len} descriptor values cannot be split into rows of dimension {dim}")]
    InvalidDescriptorLayout { dim: usize, len: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;

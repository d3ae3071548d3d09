use keytrack_core::CoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescribeError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid BRIEF patch size: {0} (must be odd and in 5..=63)")]
    InvalidPatchSize(usize),
    #[error("invalid patch grid size: {0} (must be in 2..=32)")]
    InvalidGridSize(usize),
    #[error("invalid patch window scale: {0} (must be finite and > 0)")]
    InvalidWindowScale(f32),
    #[error("unknown descriptor '{0}' (expected brief or patch)")]
    UnknownDescriptor(String),
}

impl DescribeError {
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, DescribeError::Core(_))
    }
}

pub type DescribeResult<T> = Result<T, DescribeError>;

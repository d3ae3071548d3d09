use keytrack_core::CoreError;
use thiserror::Error;

/// Detection errors. Everything except `Core` is a configuration error and is
/// raised before any pixel is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid max overlap: {0} (must be in [0, 1))")]
    InvalidMaxOverlap(f32),
    #[error("invalid min response: {0} (must be in [0, 255])")]
    InvalidMinResponse(f32),
    #[error("invalid keypoint size: {0} (must be finite and > 0)")]
    InvalidKeypointSize(f32),
    #[error("invalid block size: {0} (must be >= 1)")]
    InvalidBlockSize(usize),
    #[error("invalid Harris k: {0} (must be finite and > 0)")]
    InvalidHarrisK(f32),
    #[error("invalid FAST threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),
    #[error("invalid orientation patch size: {0} (must be odd and >= 3)")]
    InvalidPatchSize(usize),
    #[error("unknown detector '{0}' (expected harris, shi-tomasi, fast or orb)")]
    UnknownDetector(String),
}

impl DetectError {
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, DetectError::Core(_))
    }
}

pub type DetectResult<T> = Result<T, DetectError>;

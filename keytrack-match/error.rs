use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("invalid ratio: {0} (must be in (0, 1])")]
    InvalidRatio(f32),
    #[error("invalid neighbour count k = {0} (must be 1 or 2)")]
    InvalidK(usize),
    #[error("source descriptor {source_index} has {available} neighbour(s), the ratio test needs 2")]
    InsufficientCandidates { source_index: usize, available: usize },
    #[error("{metric} distance cannot compare {descriptors} descriptors")]
    IncompatibleMetric {
        metric: &'static str,
        descriptors: &'static str,
    },
    #[error("descriptor sets differ: source {source_layout}, reference {reference_layout}")]
    DescriptorMismatch {
        source_layout: String,
        reference_layout: String,
    },
    #[error("unknown metric '{0}' (expected hamming or l2)")]
    UnknownMetric(String),
    #[error("unknown selector '{0}' (expected nn or knn)")]
    UnknownSelector(String),
}

impl MatchError {
    /// Everything but a short candidate list is rejected before any work is done.
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, MatchError::InsufficientCandidates { .. })
    }
}

pub type MatchResult<T> = Result<T, MatchError>;

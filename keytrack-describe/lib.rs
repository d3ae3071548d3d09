//! Descriptor extraction for detected keypoints.
//!
//! Two extractors are provided: a 256-bit BRIEF descriptor compared with the
//! Hamming distance, and a zero-mean, unit-length intensity patch compared with
//! the Euclidean distance.

mod brief;
mod config;
mod error;
mod patch;
mod sampling;

pub use brief::BriefExtractor;
pub use config::{DescriptorConfig, DescriptorKind};
pub use error::{DescribeError, DescribeResult};
pub use patch::PatchExtractor;

pub use keytrack_core::{DescriptorSet, Keypoint};

/// Computes one descriptor per keypoint, in keypoint order.
pub trait DescriptorExtractor: Send + Sync {
    fn kind(&self) -> DescriptorKind;

    fn extract(
        &self,
        img: &[u8],
        width: usize,
        height: usize,
        keypoints: &[Keypoint],
    ) -> DescribeResult<DescriptorSet>;
}

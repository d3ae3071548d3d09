//! Core types shared by the keytrack crates: keypoints and their overlap
//! geometry, corner-response surfaces, descriptor sets and matches.

mod error;
mod keypoint;
mod matches;
mod surface;

pub use error::{CoreError, CoreResult};
pub use keypoint::Keypoint;
pub use matches::{BinaryDescriptor, DescriptorSet, Match, BINARY_DESCRIPTOR_BYTES};
pub use surface::ResponseSurface;

/// Checks that a row-major grayscale buffer matches its declared dimensions.
pub fn validate_image(data: &[u8], width: usize, height: usize) -> CoreResult<()> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidImageSize { width, height });
    }
    let expected_len = width * height;
    if data.len() != expected_len {
        return Err(CoreError::InvalidImageData {
            expected_len,
            actual_len: data.len(),
        });
    }
    Ok(())
}

/// One worker per logical CPU, never zero.
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

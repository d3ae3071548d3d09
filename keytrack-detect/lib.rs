//! Corner-response producers and the greedy non-maximum suppression that turns
//! a response surface into a deduplicated keypoint sequence, with optional
//! intensity-centroid orientation.

mod config;
mod detector;
mod error;
mod gradient;
mod orientation;
mod response;
mod selector;

pub use config::{DetectorConfig, DetectorKind};
pub use detector::Detector;
pub use error::{DetectError, DetectResult};
pub use orientation::IntensityCentroid;
pub use response::{
    CornerResponse, FastResponse, HarrisResponse, ShiTomasiResponse, RESPONSE_MAX,
};
pub use selector::{KeypointSelector, SelectionStats};

pub use keytrack_core::{Keypoint, ResponseSurface};

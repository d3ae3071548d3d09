use crate::config::{DetectorConfig, DetectorKind};
use crate::error::DetectResult;
use crate::orientation::IntensityCentroid;
use crate::response::{CornerResponse, FastResponse, HarrisResponse, ShiTomasiResponse};
use crate::selector::KeypointSelector;
use keytrack_core::{Keypoint, ResponseSurface};
use log::debug;

/// Response producer paired with the keypoint selector, and for oriented
/// kinds the orientation assigned after selection.
pub struct Detector {
    kind: DetectorKind,
    response: Box<dyn CornerResponse>,
    selector: KeypointSelector,
    orientation: Option<IntensityCentroid>,
}

impl Detector {
    /// Resolves the configured kind into its response producer.
    pub fn new(config: &DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        let response: Box<dyn CornerResponse> = match config.kind {
            DetectorKind::Harris => Box::new(HarrisResponse::new(config.block_size, config.harris_k)?),
            DetectorKind::ShiTomasi => Box::new(ShiTomasiResponse::new(config.block_size)?),
            DetectorKind::Fast | DetectorKind::Orb => Box::new(FastResponse::new(config.fast_threshold)?),
        };
        let orientation = if config.kind.is_oriented() {
            Some(IntensityCentroid::new(config.orientation_patch)?)
        } else {
            None
        };
        let selector =
            KeypointSelector::new(config.min_response, config.max_overlap, config.keypoint_size)?;
        Ok(Self {
            kind: config.kind,
            response,
            selector,
            orientation,
        })
    }

    /// Pairs an arbitrary response producer with a selector.
    pub fn from_parts(response: Box<dyn CornerResponse>, selector: KeypointSelector) -> Self {
        Self {
            kind: response.kind(),
            response,
            selector,
            orientation: None,
        }
    }

    /// Assign intensity-centroid angles to every detected keypoint.
    pub fn with_orientation(mut self, orientation: IntensityCentroid) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn kind(&self) -> DetectorKind {
        self.kind
    }

    pub fn orientation(&self) -> Option<&IntensityCentroid> {
        self.orientation.as_ref()
    }

    pub fn selector(&self) -> &KeypointSelector {
        &self.selector
    }

    /// Normalized response surface of the image.
    pub fn response_surface(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface> {
        self.response.compute(img, width, height)
    }

    pub fn detect(&self, img: &[u8], width: usize, height: usize) -> DetectResult<Vec<Keypoint>> {
        let surface = self.response_surface(img, width, height)?;
        let (mut keypoints, stats) = self.selector.select_with_stats(&surface);
        if let Some(orientation) = &self.orientation {
            orientation.orient(img, width, height, &mut keypoints)?;
        }
        debug!(
            "Detector::detect kind={} {}x{} candidates={} keypoints={} oriented={}",
            self.kind(),
            width,
            height,
            stats.candidates,
            keypoints.len(),
            self.orientation.is_some()
        );
        Ok(keypoints)
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("kind", &self.kind())
            .field("selector", &self.selector)
            .field("orientation", &self.orientation)
            .finish()
    }
}

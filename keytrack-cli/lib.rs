//! High-level keypoint tracking pipeline: detection, description and matching
//! between two frames, configured from one [`PipelineConfig`].

mod config;
pub mod render;

use keytrack_core::validate_image;
use keytrack_describe::{DescribeError, DescriptorExtractor};
use keytrack_detect::{DetectError, Detector};
use keytrack_match::{MatchError, MatchSelector, NeighborSearch, SelectorKind};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

pub use config::PipelineConfig;
pub use keytrack_core::{self, DescriptorSet, Keypoint, Match};
pub use keytrack_describe::DescriptorKind;
pub use keytrack_detect::DetectorKind;
pub use keytrack_match::DistanceMetric;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("detection: {0}")]
    Detect(#[from] DetectError),
    #[error("description: {0}")]
    Describe(#[from] DescribeError),
    #[error("matching: {0}")]
    Match(#[from] MatchError),
    #[error("thread count must be at least 1")]
    InvalidThreadCount,
    #[error("unsupported config format: {0} (expected .json or .toml)")]
    UnsupportedConfigFormat(PathBuf),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML config: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl PipelineError {
    /// Whether the error was raised while validating configuration, before any
    /// image data was touched.
    pub fn is_invalid_configuration(&self) -> bool {
        match self {
            PipelineError::Detect(e) => e.is_invalid_configuration(),
            PipelineError::Describe(e) => e.is_invalid_configuration(),
            PipelineError::Match(e) => e.is_invalid_configuration(),
            PipelineError::InvalidThreadCount => true,
            _ => false,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Borrowed row-major grayscale frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> Frame<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }
}

/// Selected matches with the number of source descriptors that had
/// neighbours and how many of those were dropped by selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchReport {
    pub matches: Vec<Match>,
    pub candidates: usize,
    pub removed: usize,
}

/// Everything computed while tracking keypoints from one frame to the next.
/// Match source indices refer to `source_keypoints`, reference indices to
/// `reference_keypoints`.
#[derive(Debug, Clone)]
pub struct TrackResult {
    pub source_keypoints: Vec<Keypoint>,
    pub reference_keypoints: Vec<Keypoint>,
    pub report: MatchReport,
}

/// Configured detector, descriptor extractor, neighbour search and match
/// selector. All kinds are resolved here and nowhere else.
pub struct Pipeline {
    config: PipelineConfig,
    detector: Detector,
    extractor: Box<dyn DescriptorExtractor>,
    search: Box<dyn NeighborSearch>,
    selector: MatchSelector,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let detector = config.detector.build()?;
        let extractor = config.descriptor.build()?;
        let search = config.matcher.build_search();
        let selector = config.matcher.build_selector()?;
        debug!("Pipeline::new\n{}", config.summary());

        Ok(Self {
            config,
            detector,
            extractor,
            search,
            selector,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detect(&self, img: &[u8], width: usize, height: usize) -> PipelineResult<Vec<Keypoint>> {
        let t0 = Instant::now();
        let keypoints = self.detector.detect(img, width, height)?;
        info!(
            "{} detection with n={} keypoints in {:.2} ms",
            self.detector.kind(),
            keypoints.len(),
            elapsed_ms(t0)
        );
        Ok(keypoints)
    }

    pub fn describe(
        &self,
        img: &[u8],
        width: usize,
        height: usize,
        keypoints: &[Keypoint],
    ) -> PipelineResult<DescriptorSet> {
        let t0 = Instant::now();
        let descriptors = self.extractor.extract(img, width, height, keypoints)?;
        info!(
            "{} descriptor extraction for n={} keypoints in {:.2} ms",
            self.extractor.kind(),
            descriptors.len(),
            elapsed_ms(t0)
        );
        Ok(descriptors)
    }

    pub fn match_descriptors(
        &self,
        source: &DescriptorSet,
        reference: &DescriptorSet,
    ) -> PipelineResult<MatchReport> {
        let t0 = Instant::now();
        let report = match self.config.matcher.selector {
            SelectorKind::Nn => {
                let nearest = self.search.nearest(source, reference)?;
                let candidates = if reference.is_empty() { 0 } else { source.len() };
                let matches = self.selector.select_nn(nearest);
                MatchReport {
                    removed: candidates - matches.len(),
                    candidates,
                    matches,
                }
            }
            SelectorKind::Knn => {
                let lists = self.search.knn(source, reference, SelectorKind::Knn.k())?;
                let candidates = lists.len();
                let outcome = self.selector.select_knn(&lists)?;
                MatchReport {
                    matches: outcome.matches,
                    candidates,
                    removed: outcome.removed,
                }
            }
        };
        info!(
            "{} matching with n={} matches ({} removed) in {:.2} ms",
            self.config.matcher.selector,
            report.matches.len(),
            report.removed,
            elapsed_ms(t0)
        );
        Ok(report)
    }

    /// Detects and describes keypoints in both frames, then matches the first
    /// frame's descriptors against the second's.
    pub fn track(&self, source: Frame<'_>, reference: Frame<'_>) -> PipelineResult<TrackResult> {
        validate_image(source.data, source.width, source.height).map_err(DetectError::from)?;
        validate_image(reference.data, reference.width, reference.height).map_err(DetectError::from)?;

        let source_keypoints = self.detect(source.data, source.width, source.height)?;
        let source_descriptors =
            self.describe(source.data, source.width, source.height, &source_keypoints)?;
        let reference_keypoints = self.detect(reference.data, reference.width, reference.height)?;
        let reference_descriptors = self.describe(
            reference.data,
            reference.width,
            reference.height,
            &reference_keypoints,
        )?;
        let report = self.match_descriptors(&source_descriptors, &reference_descriptors)?;

        Ok(TrackResult {
            source_keypoints,
            reference_keypoints,
            report,
        })
    }
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(bits: &[u8]) -> DescriptorSet {
        DescriptorSet::Binary(
            bits.iter()
                .map(|&b| {
                    let mut d = [0u8; 32];
                    d[0] = b;
                    d
                })
                .collect(),
        )
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let mut config = PipelineConfig::default();
        config.matcher.ratio = 0.0;
        let err = Pipeline::new(config).err().unwrap();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn test_knn_report() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        // distances 1 vs 6 pass, 4 vs 4 fail
        let source = binary(&[0b0000_0001, 0b1111_0000]);
        let reference = binary(&[0b0000_0000, 0b0111_1111, 0b1111_1111]);
        let report = pipeline.match_descriptors(&source, &reference).unwrap();
        assert_eq!(report.candidates, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(report.matches, vec![Match::new(0, 0, 1.0)]);
    }

    #[test]
    fn test_knn_single_reference_fails() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.match_descriptors(&binary(&[1]), &binary(&[2]));
        assert!(matches!(
            result,
            Err(PipelineError::Match(MatchError::InsufficientCandidates { .. }))
        ));
    }

    #[test]
    fn test_nn_report() {
        let mut config = PipelineConfig::default();
        config.matcher.selector = SelectorKind::Nn;
        let pipeline = Pipeline::new(config).unwrap();
        let report = pipeline.match_descriptors(&binary(&[1, 2]), &binary(&[3])).unwrap();
        assert_eq!(report.candidates, 2);
        assert_eq!(report.removed, 0);
        assert_eq!(report.matches.len(), 2);

        let empty = pipeline.match_descriptors(&binary(&[1]), &binary(&[])).unwrap();
        assert_eq!(empty, MatchReport::default());
    }
}

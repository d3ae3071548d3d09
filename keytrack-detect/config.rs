use crate::detector::Detector;
use crate::error::{DetectError, DetectResult};
use crate::orientation::IntensityCentroid;
use crate::response::{HarrisResponse, RESPONSE_MAX};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Corner-response algorithm used for detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DetectorKind {
    Harris,
    ShiTomasi,
    Fast,
    /// FAST corners oriented by their intensity centroid
    Orb,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::Harris,
        DetectorKind::ShiTomasi,
        DetectorKind::Fast,
        DetectorKind::Orb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::Harris => "harris",
            DetectorKind::ShiTomasi => "shi-tomasi",
            DetectorKind::Fast => "fast",
            DetectorKind::Orb => "orb",
        }
    }

    /// Whether detected keypoints carry an orientation
    pub fn is_oriented(&self) -> bool {
        matches!(self, DetectorKind::Orb)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorKind {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "harris" => Ok(DetectorKind::Harris),
            "shi-tomasi" | "shitomasi" | "gftt" => Ok(DetectorKind::ShiTomasi),
            "fast" => Ok(DetectorKind::Fast),
            "orb" => Ok(DetectorKind::Orb),
            _ => Err(DetectError::UnknownDetector(s.to_string())),
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    /// Minimum normalized response (0-255 scale) a pixel must exceed
    pub min_response: f32,
    /// Largest permitted footprint overlap between two keypoints, in [0, 1)
    pub max_overlap: f32,
    /// Footprint diameter assigned to every detected keypoint
    pub keypoint_size: f32,
    /// Structure-tensor window for Harris and Shi-Tomasi
    pub block_size: usize,
    pub harris_k: f32,
    /// Segment-test intensity threshold for FAST and ORB
    pub fast_threshold: u8,
    /// Square patch used for ORB orientation
    pub orientation_patch: usize,
}

impl DetectorConfig {
    /// Preset for the given detector kind
    pub fn new(kind: DetectorKind) -> Self {
        match kind {
            DetectorKind::Harris => Self::harris_preset(),
            DetectorKind::ShiTomasi => Self::shi_tomasi_preset(),
            DetectorKind::Fast => Self::fast_preset(),
            DetectorKind::Orb => Self::orb_preset(),
        }
    }

    /// Harris with block size 2, Sobel aperture 3 and k = 0.04
    pub fn harris_preset() -> Self {
        Self {
            kind: DetectorKind::Harris,
            min_response: 100.0,
            max_overlap: 0.0,
            keypoint_size: (2 * HarrisResponse::SOBEL_APERTURE) as f32,
            block_size: 2,
            harris_k: 0.04,
            fast_threshold: 30,
            orientation_patch: IntensityCentroid::DEFAULT_PATCH_SIZE,
        }
    }

    /// Shi-Tomasi with block size 4 and a 1% quality level
    pub fn shi_tomasi_preset() -> Self {
        Self {
            kind: DetectorKind::ShiTomasi,
            min_response: 0.01 * RESPONSE_MAX,
            max_overlap: 0.0,
            keypoint_size: 4.0,
            block_size: 4,
            harris_k: 0.04,
            fast_threshold: 30,
            orientation_patch: IntensityCentroid::DEFAULT_PATCH_SIZE,
        }
    }

    /// FAST with threshold 30; every scored corner is a candidate
    pub fn fast_preset() -> Self {
        Self {
            kind: DetectorKind::Fast,
            min_response: 0.0,
            max_overlap: 0.0,
            keypoint_size: 7.0,
            block_size: 2,
            harris_k: 0.04,
            fast_threshold: 30,
            orientation_patch: IntensityCentroid::DEFAULT_PATCH_SIZE,
        }
    }

    /// FAST corners with a 31x31 intensity-centroid orientation patch
    pub fn orb_preset() -> Self {
        Self {
            kind: DetectorKind::Orb,
            ..Self::fast_preset()
        }
    }

    pub fn with_min_response(mut self, min_response: f32) -> Self {
        self.min_response = min_response;
        self
    }

    pub fn with_max_overlap(mut self, max_overlap: f32) -> Self {
        self.max_overlap = max_overlap;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> DetectResult<()> {
        if !(0.0..=RESPONSE_MAX).contains(&self.min_response) {
            return Err(DetectError::InvalidMinResponse(self.min_response));
        }
        if !(0.0..1.0).contains(&self.max_overlap) {
            return Err(DetectError::InvalidMaxOverlap(self.max_overlap));
        }
        if !self.keypoint_size.is_finite() || self.keypoint_size <= 0.0 {
            return Err(DetectError::InvalidKeypointSize(self.keypoint_size));
        }
        match self.kind {
            DetectorKind::Harris => {
                if self.block_size == 0 {
                    return Err(DetectError::InvalidBlockSize(self.block_size));
                }
                if !self.harris_k.is_finite() || self.harris_k <= 0.0 {
                    return Err(DetectError::InvalidHarrisK(self.harris_k));
                }
            }
            DetectorKind::ShiTomasi => {
                if self.block_size == 0 {
                    return Err(DetectError::InvalidBlockSize(self.block_size));
                }
            }
            DetectorKind::Fast | DetectorKind::Orb => {
                if self.fast_threshold == 0 || self.fast_threshold > 127 {
                    return Err(DetectError::InvalidThreshold(self.fast_threshold));
                }
            }
        }
        if self.kind.is_oriented() {
            IntensityCentroid::new(self.orientation_patch)?;
        }
        Ok(())
    }

    /// Build the configured detector
    pub fn build(&self) -> DetectResult<Detector> {
        Detector::new(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let specific = match self.kind {
            DetectorKind::Harris => format!("block={}, k={}", self.block_size, self.harris_k),
            DetectorKind::ShiTomasi => format!("block={}", self.block_size),
            DetectorKind::Fast => format!("threshold={}", self.fast_threshold),
            DetectorKind::Orb => format!(
                "threshold={}, orientation_patch={}",
                self.fast_threshold, self.orientation_patch
            ),
        };
        format!(
            "DetectorConfig: {} [{}], min_response={}, max_overlap={}, size={}",
            self.kind, specific, self.min_response, self.max_overlap, self.keypoint_size
        )
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::harris_preset()
    }
}

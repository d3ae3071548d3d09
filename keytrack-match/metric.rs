use crate::error::{MatchError, MatchResult};
use keytrack_core::BinaryDescriptor;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance between two descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DistanceMetric {
    /// Differing bits; binary descriptors only
    Hamming,
    /// Euclidean distance; binary descriptors are widened byte-wise
    L2,
}

impl DistanceMetric {
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Hamming => "hamming",
            DistanceMetric::L2 => "l2",
        }
    }

    /// Rejects metric/descriptor combinations that cannot be compared.
    pub fn check_compatible(&self, binary_descriptors: bool) -> MatchResult<()> {
        match (self, binary_descriptors) {
            (DistanceMetric::Hamming, false) => Err(MatchError::IncompatibleMetric {
                metric: self.name(),
                descriptors: "float",
            }),
            _ => Ok(()),
        }
    }

    pub fn hamming(a: &BinaryDescriptor, b: &BinaryDescriptor) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum::<u32>() as f32
    }

    pub fn l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hamming" => Ok(DistanceMetric::Hamming),
            "l2" | "euclidean" => Ok(DistanceMetric::L2),
            _ => Err(MatchError::UnknownMetric(s.to_string())),
        }
    }
}

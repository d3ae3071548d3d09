use crate::error::{MatchError, MatchResult};
use crate::metric::DistanceMetric;
use crate::search::{BruteForceMatcher, NeighborSearch};
use crate::selector::MatchSelector;
use log::warn;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How final matches are chosen from the neighbour search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SelectorKind {
    /// Keep the single nearest neighbour
    Nn,
    /// Two nearest neighbours filtered by the ratio test
    Knn,
}

impl SelectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorKind::Nn => "nn",
            SelectorKind::Knn => "knn",
        }
    }

    /// Neighbours requested per source descriptor.
    pub fn k(&self) -> usize {
        match self {
            SelectorKind::Nn => 1,
            SelectorKind::Knn => 2,
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectorKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nn" => Ok(SelectorKind::Nn),
            "knn" => Ok(SelectorKind::Knn),
            _ => Err(MatchError::UnknownSelector(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatcherConfig {
    pub metric: DistanceMetric,
    pub selector: SelectorKind,
    /// Ratio-test threshold in (0, 1]
    pub ratio: f32,
    /// Keep only mutual nearest neighbours (nearest-neighbour selection only)
    pub cross_check: bool,
}

impl MatcherConfig {
    /// Hamming distance with the ratio test, for binary descriptors
    pub fn binary_preset() -> Self {
        Self {
            metric: DistanceMetric::Hamming,
            selector: SelectorKind::Knn,
            ratio: MatchSelector::DEFAULT_RATIO,
            cross_check: false,
        }
    }

    /// Euclidean distance with the ratio test, for float descriptors
    pub fn float_preset() -> Self {
        Self {
            metric: DistanceMetric::L2,
            ..Self::binary_preset()
        }
    }

    pub fn with_selector(mut self, selector: SelectorKind) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn validate(&self) -> MatchResult<()> {
        MatchSelector::new(self.ratio)?;
        if self.cross_check && self.selector == SelectorKind::Knn {
            warn!("MatcherConfig: cross_check has no effect with the knn selector");
        }
        Ok(())
    }

    pub fn build_search(&self) -> Box<dyn NeighborSearch> {
        Box::new(BruteForceMatcher::new(self.metric, self.cross_check))
    }

    pub fn build_selector(&self) -> MatchResult<MatchSelector> {
        MatchSelector::new(self.ratio)
    }

    pub fn summary(&self) -> String {
        match self.selector {
            SelectorKind::Nn => format!(
                "MatcherConfig: brute-force {} nn, cross_check={}",
                self.metric, self.cross_check
            ),
            SelectorKind::Knn => format!(
                "MatcherConfig: brute-force {} knn, ratio={}",
                self.metric, self.ratio
            ),
        }
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

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::binary_preset()
    }
}

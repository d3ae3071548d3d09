use crate::brief::BriefExtractor;
use crate::error::{DescribeError, DescribeResult};
use crate::patch::PatchExtractor;
use crate::DescriptorExtractor;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Descriptor family computed for each keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DescriptorKind {
    Brief,
    Patch,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 2] = [DescriptorKind::Brief, DescriptorKind::Patch];

    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Brief => "brief",
            DescriptorKind::Patch => "patch",
        }
    }

    /// Binary descriptors are compared bitwise, float descriptors numerically.
    pub fn is_binary(&self) -> bool {
        matches!(self, DescriptorKind::Brief)
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DescriptorKind {
    type Err = DescribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brief" => Ok(DescriptorKind::Brief),
            "patch" => Ok(DescriptorKind::Patch),
            _ => Err(DescribeError::UnknownDescriptor(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DescriptorConfig {
    pub kind: DescriptorKind,
    /// BRIEF sampling patch side, odd
    pub patch_size: usize,
    /// Samples per side of the intensity patch
    pub grid_size: usize,
    /// Intensity patch side as a multiple of the keypoint size
    pub window_scale: f32,
}

impl DescriptorConfig {
    pub fn new(kind: DescriptorKind) -> Self {
        Self {
            kind,
            ..Self::brief_preset()
        }
    }

    pub fn brief_preset() -> Self {
        Self {
            kind: DescriptorKind::Brief,
            patch_size: BriefExtractor::DEFAULT_PATCH_SIZE,
            grid_size: PatchExtractor::DEFAULT_GRID,
            window_scale: PatchExtractor::DEFAULT_WINDOW_SCALE,
        }
    }

    pub fn patch_preset() -> Self {
        Self::new(DescriptorKind::Patch)
    }

    pub fn validate(&self) -> DescribeResult<()> {
        self.build().map(|_| ())
    }

    /// Build the configured extractor
    pub fn build(&self) -> DescribeResult<Box<dyn DescriptorExtractor>> {
        Ok(match self.kind {
            DescriptorKind::Brief => Box::new(BriefExtractor::new(self.patch_size)?),
            DescriptorKind::Patch => Box::new(PatchExtractor::new(self.grid_size, self.window_scale)?),
        })
    }

    pub fn summary(&self) -> String {
        match self.kind {
            DescriptorKind::Brief => format!("DescriptorConfig: brief [patch={}]", self.patch_size),
            DescriptorKind::Patch => format!(
                "DescriptorConfig: patch [grid={}, window_scale={}]",
                self.grid_size, self.window_scale
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

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self::brief_preset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        for kind in DescriptorKind::ALL {
            let config = DescriptorConfig::new(kind);
            let extractor = config.build().unwrap();
            assert_eq!(extractor.kind(), kind);
        }
        assert!(DescriptorKind::Brief.is_binary());
        assert!(!DescriptorKind::Patch.is_binary());
    }

    #[test]
    fn test_validation_is_per_kind() {
        // patch parameters are ignored for BRIEF and vice versa
        let mut config = DescriptorConfig::brief_preset();
        config.grid_size = 0;
        assert!(config.validate().is_ok());
        config.kind = DescriptorKind::Patch;
        assert_eq!(config.validate(), Err(DescribeError::InvalidGridSize(0)));

        let mut config = DescriptorConfig::brief_preset();
        config.patch_size = 32;
        assert_eq!(config.validate(), Err(DescribeError::InvalidPatchSize(32)));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("BRIEF".parse::<DescriptorKind>().unwrap(), DescriptorKind::Brief);
        assert_eq!("patch".parse::<DescriptorKind>().unwrap(), DescriptorKind::Patch);
        assert!(matches!(
            "sift".parse::<DescriptorKind>(),
            Err(DescribeError::UnknownDescriptor(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialization() {
        let config = DescriptorConfig::patch_preset();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"patch\""));
        assert_eq!(DescriptorConfig::from_json(&json).unwrap(), config);
        let toml_str = config.to_toml().unwrap();
        assert_eq!(DescriptorConfig::from_toml(&toml_str).unwrap(), config);
        assert!(DescriptorConfig::from_toml("kind = \"brief\"\npatch_size = 4\n").is_err());
    }
}

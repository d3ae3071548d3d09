use crate::{PipelineError, PipelineResult};
use keytrack_core::default_threads;
use keytrack_describe::{DescriptorConfig, DescriptorKind};
use keytrack_detect::{DetectorConfig, DetectorKind};
use keytrack_match::MatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete pipeline configuration: one section per stage plus the worker
/// count used for the global thread pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub descriptor: DescriptorConfig,
    pub matcher: MatcherConfig,
    pub n_threads: usize,
}

impl PipelineConfig {
    /// Stage presets for the given detector and descriptor; the matcher metric
    /// follows the descriptor family.
    pub fn new(detector: DetectorKind, descriptor: DescriptorKind) -> Self {
        Self {
            detector: DetectorConfig::new(detector),
            descriptor: DescriptorConfig::new(descriptor),
            matcher: Self::matcher_for(descriptor),
            n_threads: default_threads(),
        }
    }

    /// Matcher preset suited to a descriptor family
    pub fn matcher_for(descriptor: DescriptorKind) -> MatcherConfig {
        if descriptor.is_binary() {
            MatcherConfig::binary_preset()
        } else {
            MatcherConfig::float_preset()
        }
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Validates every stage and the metric/descriptor pairing.
    pub fn validate(&self) -> PipelineResult<()> {
        self.detector.validate()?;
        self.descriptor.validate()?;
        self.matcher.validate()?;
        self.matcher
            .metric
            .check_compatible(self.descriptor.kind.is_binary())?;
        if self.n_threads == 0 {
            return Err(PipelineError::InvalidThreadCount);
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\n{}\nthreads={}",
            self.detector.summary(),
            self.descriptor.summary(),
            self.matcher.summary(),
            self.n_threads
        )
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> PipelineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(toml_str: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        write_file(path.as_ref(), &self.to_json()?)
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        write_file(path.as_ref(), &self.to_toml()?)
    }

    /// Load configuration from TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        Self::from_toml(&read_file(path.as_ref())?)
    }

    /// Load a `.json` or `.toml` file, chosen by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Self::load_json(path),
            Some("toml") => Self::load_toml(path),
            _ => Err(PipelineError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DetectorKind::Harris, DescriptorKind::Brief)
    }
}

fn read_file(path: &Path) -> PipelineResult<String> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> PipelineResult<()> {
    std::fs::write(path, content).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

//! Descriptor matching: exhaustive neighbour search under a Hamming or L2
//! metric, followed by either plain nearest-neighbour selection or Lowe's
//! ratio test.

mod config;
mod error;
mod metric;
mod search;
mod selector;

pub use config::{MatcherConfig, SelectorKind};
pub use error::{MatchError, MatchResult};
pub use metric::DistanceMetric;
pub use search::{BruteForceMatcher, NeighborSearch};
pub use selector::{CandidatePair, MatchSelector, RatioTestOutcome};

pub use keytrack_core::{DescriptorSet, Match};

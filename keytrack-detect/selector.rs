use crate::error::{DetectError, DetectResult};
use crate::response::RESPONSE_MAX;
use keytrack_core::{Keypoint, ResponseSurface};
use log::debug;

/// Counters collected during one selection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Candidates above the response threshold.
    pub candidates: usize,
    pub appended: usize,
    pub replaced: usize,
    pub suppressed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insertion {
    Appended,
    Replaced(usize),
    Suppressed,
}

/// Thresholds a response surface and performs greedy overlap-based
/// non-maximum suppression.
///
/// Pixels are visited in raster order. Each candidate is compared against the
/// accepted keypoints in insertion order; the first keypoint it overlaps by
/// more than `max_overlap` decides its fate: a strictly stronger candidate
/// takes that keypoint's slot, otherwise the candidate is dropped. Candidates
/// that overlap nothing are appended.
///
/// The result depends on the visiting order. A replacement is not re-checked
/// against later entries, so two returned keypoints can still overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSelector {
    min_response: f32,
    max_overlap: f32,
    keypoint_size: f32,
}

impl KeypointSelector {
    pub const DEFAULT_MIN_RESPONSE: f32 = 100.0;
    pub const DEFAULT_MAX_OVERLAP: f32 = 0.0;

    pub fn new(min_response: f32, max_overlap: f32, keypoint_size: f32) -> DetectResult<Self> {
        if !(0.0..=RESPONSE_MAX).contains(&min_response) {
            return Err(DetectError::InvalidMinResponse(min_response));
        }
        if !(0.0..1.0).contains(&max_overlap) {
            return Err(DetectError::InvalidMaxOverlap(max_overlap));
        }
        if !keypoint_size.is_finite() || keypoint_size <= 0.0 {
            return Err(DetectError::InvalidKeypointSize(keypoint_size));
        }
        Ok(Self {
            min_response,
            max_overlap,
            keypoint_size,
        })
    }

    pub fn min_response(&self) -> f32 {
        self.min_response
    }

    pub fn max_overlap(&self) -> f32 {
        self.max_overlap
    }

    pub fn keypoint_size(&self) -> f32 {
        self.keypoint_size
    }

    /// Select keypoints from every pixel whose response exceeds `min_response`.
    pub fn select(&self, surface: &ResponseSurface) -> Vec<Keypoint> {
        self.select_with_stats(surface).0
    }

    pub fn select_with_stats(&self, surface: &ResponseSurface) -> (Vec<Keypoint>, SelectionStats) {
        let candidates = surface.raster().map(|(x, y, value)| {
            Keypoint::new(x as f32, y as f32, self.keypoint_size).with_response(value)
        });
        let (keypoints, stats) = self.suppress_with_stats(candidates);
        debug!(
            "KeypointSelector::select {}x{} candidates={} kept={} replaced={} suppressed={}",
            surface.width(),
            surface.height(),
            stats.candidates,
            keypoints.len(),
            stats.replaced,
            stats.suppressed
        );
        (keypoints, stats)
    }

    /// Run the suppression over explicit candidates, in the given order.
    /// Candidates keep their own size; those at or below `min_response` are skipped.
    pub fn suppress<I>(&self, candidates: I) -> Vec<Keypoint>
    where
        I: IntoIterator<Item = Keypoint>,
    {
        self.suppress_with_stats(candidates).0
    }

    fn suppress_with_stats<I>(&self, candidates: I) -> (Vec<Keypoint>, SelectionStats)
    where
        I: IntoIterator<Item = Keypoint>,
    {
        let mut keypoints: Vec<Keypoint> = Vec::new();
        let mut stats = SelectionStats::default();

        for candidate in candidates {
            // NaN responses fail this comparison too
            if !(candidate.response > self.min_response) {
                continue;
            }
            stats.candidates += 1;
            match self.insert(&mut keypoints, candidate) {
                Insertion::Appended => stats.appended += 1,
                Insertion::Replaced(_) => stats.replaced += 1,
                Insertion::Suppressed => stats.suppressed += 1,
            }
        }

        (keypoints, stats)
    }

    fn insert(&self, keypoints: &mut Vec<Keypoint>, candidate: Keypoint) -> Insertion {
        for (idx, existing) in keypoints.iter_mut().enumerate() {
            if candidate.overlap(existing) > self.max_overlap {
                if candidate.response > existing.response {
                    *existing = candidate;
                    return Insertion::Replaced(idx);
                }
                return Insertion::Suppressed;
            }
        }
        keypoints.push(candidate);
        Insertion::Appended
    }
}

impl Default for KeypointSelector {
    fn default() -> Self {
        Self {
            min_response: Self::DEFAULT_MIN_RESPONSE,
            max_overlap: Self::DEFAULT_MAX_OVERLAP,
            keypoint_size: 6.0,
        }
    }
}

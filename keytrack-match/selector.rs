use crate::error::{MatchError, MatchResult};
use keytrack_core::Match;
use log::debug;

/// Best and second-best neighbour of one source descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub best: Match,
    pub second: Match,
}

impl CandidatePair {
    /// First two entries of an ascending neighbour list.
    pub fn from_candidates(candidates: &[Match]) -> Option<Self> {
        match candidates {
            [best, second, ..] => Some(Self {
                best: *best,
                second: *second,
            }),
            _ => None,
        }
    }

    /// Lowe's test: the best match must be clearly closer than the runner-up.
    pub fn passes(&self, ratio: f32) -> bool {
        self.best.distance < ratio * self.second.distance
    }
}

/// Matches kept by the ratio test and how many were dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatioTestOutcome {
    pub matches: Vec<Match>,
    pub removed: usize,
}

/// Final match selection, either plain nearest neighbour or the ratio test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSelector {
    ratio: f32,
}

impl MatchSelector {
    pub const DEFAULT_RATIO: f32 = 0.8;

    pub fn new(ratio: f32) -> MatchResult<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(MatchError::InvalidRatio(ratio));
        }
        Ok(Self { ratio })
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Nearest-neighbour selection keeps every match.
    pub fn select_nn(&self, matches: Vec<Match>) -> Vec<Match> {
        matches
    }

    /// Ratio test over per-source candidate lists sorted by ascending
    /// distance. Fails as a whole if any list has fewer than two entries.
    pub fn select_knn(&self, candidates: &[Vec<Match>]) -> MatchResult<RatioTestOutcome> {
        let pairs = candidates
            .iter()
            .enumerate()
            .map(|(source_index, list)| {
                CandidatePair::from_candidates(list).ok_or(MatchError::InsufficientCandidates {
                    source_index,
                    available: list.len(),
                })
            })
            .collect::<MatchResult<Vec<_>>>()?;

        let matches: Vec<Match> = pairs
            .iter()
            .filter(|pair| pair.passes(self.ratio))
            .map(|pair| pair.best)
            .collect();
        let removed = pairs.len() - matches.len();
        debug!(
            "MatchSelector::select_knn ratio={} candidates={} removed={}",
            self.ratio,
            pairs.len(),
            removed
        );

        Ok(RatioTestOutcome { matches, removed })
    }
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self {
            ratio: Self::DEFAULT_RATIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidates(source_index: usize, distances: &[f32]) -> Vec<Match> {
        distances
            .iter()
            .enumerate()
            .map(|(j, &d)| Match::new(source_index, j, d))
            .collect()
    }

    #[test]
    fn test_invalid_ratio() {
        for ratio in [0.0, -0.5, 1.01, f32::NAN, f32::INFINITY] {
            assert!(matches!(MatchSelector::new(ratio), Err(MatchError::InvalidRatio(_))));
        }
        assert!(MatchSelector::new(1.0).is_ok());
        assert_eq!(MatchSelector::default().ratio(), 0.8);
    }

    #[test]
    fn test_ratio_test_keeps_distinct_best() {
        let input = vec![candidates(0, &[10.0, 20.0]), candidates(1, &[15.0, 16.0])];
        let outcome = MatchSelector::new(0.8).unwrap().select_knn(&input).unwrap();
        assert_eq!(outcome.matches, vec![Match::new(0, 0, 10.0)]);
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn test_single_neighbour_rejects_whole_call() {
        let input = vec![candidates(0, &[10.0, 20.0]), candidates(1, &[5.0])];
        let result = MatchSelector::new(0.8).unwrap().select_knn(&input);
        assert_eq!(
            result,
            Err(MatchError::InsufficientCandidates {
                source_index: 1,
                available: 1
            })
        );
    }

    #[test]
    fn test_empty_input() {
        let outcome = MatchSelector::default().select_knn(&[]).unwrap();
        assert_eq!(outcome, RatioTestOutcome::default());
    }

    #[test]
    fn test_equal_distances_are_discarded() {
        let input = vec![candidates(0, &[7.0, 7.0])];
        let outcome = MatchSelector::new(1.0).unwrap().select_knn(&input).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn test_nn_is_identity() {
        let matches = candidates(3, &[1.0, 2.0]);
        assert_eq!(MatchSelector::default().select_nn(matches.clone()), matches);
    }

    fn candidate_lists() -> impl Strategy<Value = Vec<Vec<Match>>> {
        prop::collection::vec((0.0f32..500.0, 0.0f32..500.0), 0..40).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (a, b))| candidates(i, &[a.min(b), a.max(b)]))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn ratio_test_is_sound(lists in candidate_lists(), ratio in 0.05f32..=1.0) {
            let outcome = MatchSelector::new(ratio).unwrap().select_knn(&lists).unwrap();
            prop_assert_eq!(outcome.matches.len() + outcome.removed, lists.len());

            let mut kept = outcome.matches.iter().peekable();
            for list in &lists {
                let passes = list[0].distance < ratio * list[1].distance;
                if kept.peek().is_some_and(|m| m.source_index == list[0].source_index) {
                    prop_assert!(passes);
                    prop_assert_eq!(kept.next(), Some(&list[0]));
                } else {
                    prop_assert!(!passes);
                }
            }
            prop_assert!(kept.next().is_none());
        }

        #[test]
        fn unit_ratio_keeps_strictly_better(lists in candidate_lists()) {
            let outcome = MatchSelector::new(1.0).unwrap().select_knn(&lists).unwrap();
            let strictly_better = lists
                .iter()
                .filter(|l| l[0].distance < l[1].distance)
                .count();
            prop_assert_eq!(outcome.matches.len(), strictly_better);
        }
    }
}

use crate::error::{MatchError, MatchResult};
use crate::metric::DistanceMetric;
use keytrack_core::{BinaryDescriptor, DescriptorSet, Match};
use log::debug;
use rayon::prelude::*;
use std::borrow::Cow;

/// Nearest-neighbour search of source descriptors against reference descriptors.
pub trait NeighborSearch: Send + Sync {
    /// Up to `k` nearest references per source descriptor, ascending by
    /// distance, in source order.
    fn knn(&self, source: &DescriptorSet, reference: &DescriptorSet, k: usize) -> MatchResult<Vec<Vec<Match>>>;

    /// Single best reference per source descriptor, in source order.
    fn nearest(&self, source: &DescriptorSet, reference: &DescriptorSet) -> MatchResult<Vec<Match>>;
}

/// Exhaustive matcher comparing every source descriptor with every reference.
/// Equal distances resolve to the lower reference index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BruteForceMatcher {
    metric: DistanceMetric,
    cross_check: bool,
}

/// Descriptor pair prepared for one metric.
enum Pairing<'a> {
    Binary(&'a [BinaryDescriptor], &'a [BinaryDescriptor]),
    Float {
        dim: usize,
        source: Cow<'a, [f32]>,
        reference: Cow<'a, [f32]>,
    },
}

impl Pairing<'_> {
    fn source_len(&self) -> usize {
        match self {
            Pairing::Binary(s, _) => s.len(),
            Pairing::Float { dim, source, .. } => source.len() / dim,
        }
    }

    fn reference_len(&self) -> usize {
        match self {
            Pairing::Binary(_, r) => r.len(),
            Pairing::Float { dim, reference, .. } => reference.len() / dim,
        }
    }

    fn distance(&self, i: usize, j: usize) -> f32 {
        match self {
            Pairing::Binary(s, r) => DistanceMetric::hamming(&s[i], &r[j]),
            Pairing::Float { dim, source, reference } => DistanceMetric::l2(
                &source[i * dim..(i + 1) * dim],
                &reference[j * dim..(j + 1) * dim],
            ),
        }
    }

    /// `k` best matches for every query, queries drawn from the reference side
    /// when `reverse` is set.
    fn rank(&self, k: usize, reverse: bool) -> Vec<Vec<Match>> {
        let (n_query, n_train) = if reverse {
            (self.reference_len(), self.source_len())
        } else {
            (self.source_len(), self.reference_len())
        };

        (0..n_query)
            .into_par_iter()
            .map(|q| {
                let mut best: Vec<Match> = Vec::with_capacity(k + 1);
                for t in 0..n_train {
                    let (i, j) = if reverse { (t, q) } else { (q, t) };
                    let d = self.distance(i, j);
                    // strict comparison keeps the earlier index on ties
                    let pos = best.iter().position(|m| d < m.distance).unwrap_or(best.len());
                    if pos < k {
                        best.insert(pos, Match::new(q, t, d));
                        best.truncate(k);
                    }
                }
                best
            })
            .collect()
    }
}

fn layout(set: &DescriptorSet) -> String {
    if set.is_binary() {
        "binary".to_string()
    } else {
        format!("float[{}]", set.dim())
    }
}

impl BruteForceMatcher {
    pub fn new(metric: DistanceMetric, cross_check: bool) -> Self {
        Self { metric, cross_check }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn cross_check(&self) -> bool {
        self.cross_check
    }

    fn pair<'a>(&self, source: &'a DescriptorSet, reference: &'a DescriptorSet) -> MatchResult<Pairing<'a>> {
        if source.is_binary() != reference.is_binary() || source.dim() != reference.dim() {
            return Err(MatchError::DescriptorMismatch {
                source_layout: layout(source),
                reference_layout: layout(reference),
            });
        }
        self.metric.check_compatible(source.is_binary())?;

        Ok(match (self.metric, source, reference) {
            (DistanceMetric::Hamming, DescriptorSet::Binary(s), DescriptorSet::Binary(r)) => Pairing::Binary(s, r),
            _ => Pairing::Float {
                dim: source.dim(),
                source: source.float_values(),
                reference: reference.float_values(),
            },
        })
    }
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self::new(DistanceMetric::Hamming, false)
    }
}

impl NeighborSearch for BruteForceMatcher {
    fn knn(&self, source: &DescriptorSet, reference: &DescriptorSet, k: usize) -> MatchResult<Vec<Vec<Match>>> {
        if !(1..=2).contains(&k) {
            return Err(MatchError::InvalidK(k));
        }
        let pairing = self.pair(source, reference)?;
        if source.is_empty() || reference.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = pairing.rank(k, false);
        debug!(
            "BruteForceMatcher::knn metric={} k={} source={} reference={}",
            self.metric,
            k,
            source.len(),
            reference.len()
        );
        Ok(candidates)
    }

    fn nearest(&self, source: &DescriptorSet, reference: &DescriptorSet) -> MatchResult<Vec<Match>> {
        let pairing = self.pair(source, reference)?;
        if source.is_empty() || reference.is_empty() {
            return Ok(Vec::new());
        }

        let forward: Vec<Match> = pairing.rank(1, false).into_iter().flatten().collect();
        if !self.cross_check {
            return Ok(forward);
        }

        let backward = pairing.rank(1, true);
        let total = forward.len();
        let matches: Vec<Match> = forward
            .into_iter()
            .filter(|m| {
                backward[m.reference_index]
                    .first()
                    .is_some_and(|b| b.reference_index == m.source_index)
            })
            .collect();
        debug!(
            "BruteForceMatcher::nearest cross_check rejected={} kept={}",
            total - matches.len(),
            matches.len()
        );
        Ok(matches)
    }
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

    fn float(rows: &[[f32; 2]]) -> DescriptorSet {
        DescriptorSet::float(2, rows.iter().flatten().copied().collect()).unwrap()
    }

    #[test]
    fn test_knn_sorted_and_in_source_order() {
        let source = binary(&[0b0000_0000, 0b1111_0000]);
        let reference = binary(&[0b1111_1111, 0b0000_0001, 0b1110_0000]);
        let matcher = BruteForceMatcher::default();
        let knn = matcher.knn(&source, &reference, 2).unwrap();
        assert_eq!(knn.len(), 2);
        assert_eq!(knn[0], vec![Match::new(0, 1, 1.0), Match::new(0, 2, 3.0)]);
        assert_eq!(knn[1], vec![Match::new(1, 2, 1.0), Match::new(1, 0, 4.0)]);
    }

    #[test]
    fn test_ties_prefer_lower_reference_index() {
        let source = binary(&[0b0000_0011]);
        let reference = binary(&[0b0000_0001, 0b0000_0010, 0b0000_0011]);
        let knn = BruteForceMatcher::default().knn(&source, &reference, 2).unwrap();
        assert_eq!(knn[0], vec![Match::new(0, 2, 0.0), Match::new(0, 0, 1.0)]);

        let nearest = BruteForceMatcher::default()
            .nearest(&binary(&[0b0000_0000]), &reference)
            .unwrap();
        assert_eq!(nearest, vec![Match::new(0, 0, 1.0)]);
    }

    #[test]
    fn test_single_reference_gives_single_candidate() {
        let knn = BruteForceMatcher::default()
            .knn(&binary(&[1, 2]), &binary(&[3]), 2)
            .unwrap();
        assert!(knn.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_invalid_k() {
        let set = binary(&[1]);
        let matcher = BruteForceMatcher::default();
        assert_eq!(matcher.knn(&set, &set, 0), Err(MatchError::InvalidK(0)));
        assert_eq!(matcher.knn(&set, &set, 3), Err(MatchError::InvalidK(3)));
    }

    #[test]
    fn test_empty_sets() {
        let matcher = BruteForceMatcher::default();
        assert!(matcher.knn(&binary(&[]), &binary(&[1]), 2).unwrap().is_empty());
        assert!(matcher.nearest(&binary(&[1]), &binary(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_metric_and_layout_checks() {
        let hamming = BruteForceMatcher::new(DistanceMetric::Hamming, false);
        let l2 = BruteForceMatcher::new(DistanceMetric::L2, false);
        let f = float(&[[0.0, 1.0]]);
        assert!(matches!(hamming.nearest(&f, &f), Err(MatchError::IncompatibleMetric { .. })));
        assert!(matches!(l2.nearest(&f, &binary(&[1])), Err(MatchError::DescriptorMismatch { .. })));
        let wide = DescriptorSet::float(3, vec![0.0; 3]).unwrap();
        assert!(matches!(l2.nearest(&f, &wide), Err(MatchError::DescriptorMismatch { .. })));
    }

    #[test]
    fn test_l2_on_float_and_widened_binary() {
        let l2 = BruteForceMatcher::new(DistanceMetric::L2, false);
        let source = float(&[[0.0, 0.0], [10.0, 10.0]]);
        let reference = float(&[[9.0, 10.0], [3.0, 4.0]]);
        assert_eq!(
            l2.nearest(&source, &reference).unwrap(),
            vec![Match::new(0, 1, 5.0), Match::new(1, 0, 1.0)]
        );

        // bytes 0 and 3 differ by 3 in the first component only
        let nearest = l2.nearest(&binary(&[0]), &binary(&[3, 200])).unwrap();
        assert_eq!(nearest, vec![Match::new(0, 0, 3.0)]);
    }

    #[test]
    fn test_cross_check() {
        let source = float(&[[0.0, 0.0], [1.0, 0.0]]);
        let reference = float(&[[1.2, 0.0]]);
        let plain = BruteForceMatcher::new(DistanceMetric::L2, false);
        let checked = BruteForceMatcher::new(DistanceMetric::L2, true);
        assert_eq!(plain.nearest(&source, &reference).unwrap().len(), 2);
        let kept = checked.nearest(&source, &reference).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!((kept[0].source_index, kept[0].reference_index), (1, 0));
        assert!(checked.cross_check());
    }
}

//! 5-dimensional profile vectors and similarity metrics
//!
//! The numeric model behind all compatibility scoring: five named
//! components, conventionally in [0,100] but never clamped here. Two
//! similarity formulas coexist on purpose: the cosine-based
//! [`similarity_score`] drives session matching, while the distance-based
//! [`distance_similarity`] drives the legacy per-account matching. They
//! produce different numbers and both are part of the observable behavior.
//!
//! All operations are pure; derived vectors are new values.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Maximum Euclidean distance between two in-range vectors
/// (each of the five components differing by the full 100).
const MAX_DISTANCE: f64 = 223.60679774997896; // sqrt(5 * 100^2)

/// A personality profile as five ordered numeric components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileVector {
    pub sociality: f64,
    pub activity: f64,
    pub intimacy: f64,
    pub immersion: f64,
    pub flexibility: f64,
}

impl ProfileVector {
    pub const DIMENSIONS: usize = 5;

    pub fn new(
        sociality: f64,
        activity: f64,
        intimacy: f64,
        immersion: f64,
        flexibility: f64,
    ) -> Self {
        Self {
            sociality,
            activity,
            intimacy,
            immersion,
            flexibility,
        }
    }

    /// Build from a slice in fixed component order; rejects wrong
    /// dimensionality.
    pub fn from_slice(components: &[f64]) -> Option<Self> {
        match components {
            &[sociality, activity, intimacy, immersion, flexibility] => Some(Self {
                sociality,
                activity,
                intimacy,
                immersion,
                flexibility,
            }),
            _ => None,
        }
    }

    /// Components in fixed order
    pub fn to_array(self) -> [f64; Self::DIMENSIONS] {
        [
            self.sociality,
            self.activity,
            self.intimacy,
            self.immersion,
            self.flexibility,
        ]
    }

    pub fn magnitude(&self) -> f64 {
        self.to_array().iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Unit vector; the zero vector stays zero rather than faulting.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            return Self::default();
        }
        Self {
            sociality: self.sociality / mag,
            activity: self.activity / mag,
            intimacy: self.intimacy / mag,
            immersion: self.immersion / mag,
            flexibility: self.flexibility / mag,
        }
    }

    /// Componentwise product, for biasing a profile before scoring
    pub fn apply_weights(&self, weights: &Self) -> Self {
        Self {
            sociality: self.sociality * weights.sociality,
            activity: self.activity * weights.activity,
            intimacy: self.intimacy * weights.intimacy,
            immersion: self.immersion * weights.immersion,
            flexibility: self.flexibility * weights.flexibility,
        }
    }
}

/// Euclidean distance between two vectors
pub fn euclidean_distance(a: &ProfileVector, b: &ProfileVector) -> f64 {
    let (a, b) = (a.to_array(), b.to_array());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Manhattan distance between two vectors
pub fn manhattan_distance(a: &ProfileVector, b: &ProfileVector) -> f64 {
    let (a, b) = (a.to_array(), b.to_array());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Cosine similarity in [-1, 1]; defined as 0 when either magnitude is 0.
pub fn cosine_similarity(a: &ProfileVector, b: &ProfileVector) -> f64 {
    let dot: f64 = a
        .to_array()
        .iter()
        .zip(b.to_array().iter())
        .map(|(x, y)| x * y)
        .sum();

    let mag_a = a.magnitude();
    let mag_b = b.magnitude();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Cosine similarity mapped onto [0, 100], one decimal place.
///
/// The canonical compatibility percentage used for session matching.
pub fn similarity_score(a: &ProfileVector, b: &ProfileVector) -> f64 {
    let cosine = cosine_similarity(a, b);
    round1(((cosine + 1.0) / 2.0) * 100.0)
}

/// Euclidean distance mapped onto [0, 100], floored at 0, one decimal
/// place. The legacy per-account metric.
pub fn distance_similarity(a: &ProfileVector, b: &ProfileVector) -> f64 {
    let distance = euclidean_distance(a, b);
    let similarity = (1.0 - distance / MAX_DISTANCE) * 100.0;
    round1(similarity.max(0.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One batch similarity result, positionally tied to its candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityHit {
    /// The candidate's position in the input collection
    pub index: usize,
    /// Cosine-based similarity score in [0, 100]
    pub score: f64,
}

/// Compute the target's similarity score against every candidate in
/// parallel.
///
/// Output order equals input order (`output[i].index == i`); ranking is
/// the caller's responsibility. The candidate set is split into
/// contiguous chunks, one per worker, the last worker absorbing the
/// division remainder. Workers write disjoint sub-slices of the output,
/// so no locking is involved; the caller blocks until every worker has
/// finished. `workers == 0` selects the number of available processing
/// units.
pub fn batch_similarity(
    target: &ProfileVector,
    candidates: &[ProfileVector],
    workers: usize,
) -> Vec<SimilarityHit> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let workers = if workers == 0 {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    } else {
        workers
    };
    // every worker gets at least one candidate
    let workers = workers.min(candidates.len());

    let mut results = vec![SimilarityHit { index: 0, score: 0.0 }; candidates.len()];

    let chunk = candidates.len() / workers;
    std::thread::scope(|scope| {
        let mut remaining = results.as_mut_slice();
        for w in 0..workers {
            let start = w * chunk;
            let len = if w == workers - 1 {
                remaining.len()
            } else {
                chunk
            };
            let (slice, rest) = std::mem::take(&mut remaining).split_at_mut(len);
            remaining = rest;

            scope.spawn(move || {
                for (i, out) in slice.iter_mut().enumerate() {
                    let index = start + i;
                    *out = SimilarityHit {
                        index,
                        score: similarity_score(target, &candidates[index]),
                    };
                }
            });
        }
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: [f64; 5]) -> ProfileVector {
        ProfileVector::from_slice(&values).unwrap()
    }

    #[test]
    fn self_similarity_is_perfect() {
        let v = vector([90.0, 85.0, 40.0, 30.0, 50.0]);
        assert_eq!(similarity_score(&v, &v), 100.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = vector([90.0, 85.0, 40.0, 30.0, 50.0]);
        let b = vector([10.0, 20.0, 95.0, 80.0, 55.0]);
        assert_eq!(similarity_score(&a, &b), similarity_score(&b, &a));
        assert_eq!(distance_similarity(&a, &b), distance_similarity(&b, &a));
    }

    #[test]
    fn zero_magnitude_cosine_is_zero() {
        let a = vector([90.0, 85.0, 40.0, 30.0, 50.0]);
        let zero = ProfileVector::default();
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn distance_similarity_never_negative() {
        // components outside the conventional range push the raw formula
        // below zero; the score floors at 0 instead
        let a = vector([0.0, 0.0, 0.0, 0.0, 0.0]);
        let b = vector([300.0, 300.0, 300.0, 300.0, 300.0]);
        let score = distance_similarity(&a, &b);
        assert_eq!(score, 0.0);

        let c = vector([100.0, 100.0, 100.0, 100.0, 100.0]);
        let in_range = distance_similarity(&a, &c);
        assert!((0.0..=100.0).contains(&in_range));
    }

    #[test]
    fn near_identical_profiles_score_high() {
        let a = vector([90.0, 85.0, 40.0, 30.0, 50.0]);
        let b = vector([88.0, 80.0, 45.0, 35.0, 55.0]);
        assert!(similarity_score(&a, &b) >= 95.0);
    }

    #[test]
    fn normalize_produces_unit_vector_and_keeps_zero() {
        let v = vector([3.0, 4.0, 0.0, 0.0, 0.0]);
        let unit = v.normalize();
        assert!((unit.magnitude() - 1.0).abs() < 1e-12);

        let zero = ProfileVector::default().normalize();
        assert_eq!(zero, ProfileVector::default());
    }

    #[test]
    fn weights_apply_componentwise() {
        let v = vector([10.0, 20.0, 30.0, 40.0, 50.0]);
        let w = vector([2.0, 0.5, 1.0, 0.0, 1.0]);
        assert_eq!(v.apply_weights(&w), vector([20.0, 10.0, 30.0, 0.0, 50.0]));
    }

    #[test]
    fn manhattan_distance_sums_absolute_differences() {
        let a = vector([10.0, 0.0, 5.0, 0.0, 0.0]);
        let b = vector([0.0, 10.0, 5.0, 0.0, 1.0]);
        assert_eq!(manhattan_distance(&a, &b), 21.0);
    }

    #[test]
    fn from_slice_rejects_wrong_dimensionality() {
        assert!(ProfileVector::from_slice(&[1.0, 2.0]).is_none());
        assert!(ProfileVector::from_slice(&[1.0; 6]).is_none());
        assert!(ProfileVector::from_slice(&[1.0; 5]).is_some());
    }

    #[test]
    fn batch_preserves_input_positions() {
        let target = vector([50.0, 50.0, 50.0, 50.0, 50.0]);
        let candidates: Vec<ProfileVector> = (0..23)
            .map(|i| vector([i as f64, 100.0 - i as f64, 50.0, 25.0, 75.0]))
            .collect();

        for workers in [1, candidates.len(), candidates.len() + 10] {
            let results = batch_similarity(&target, &candidates, workers);
            assert_eq!(results.len(), candidates.len());
            for (i, hit) in results.iter().enumerate() {
                assert_eq!(hit.index, i);
                assert_eq!(hit.score, similarity_score(&target, &candidates[i]));
            }
        }
    }

    #[test]
    fn batch_of_nothing_is_empty() {
        let target = vector([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(batch_similarity(&target, &[], 4).is_empty());
    }

    #[test]
    fn batch_default_worker_count_matches_serial_result() {
        let target = vector([60.0, 40.0, 70.0, 20.0, 90.0]);
        let candidates: Vec<ProfileVector> = (0..7)
            .map(|i| vector([i as f64 * 10.0, 30.0, 60.0, 10.0, 80.0]))
            .collect();

        let parallel = batch_similarity(&target, &candidates, 0);
        let serial = batch_similarity(&target, &candidates, 1);
        assert_eq!(parallel, serial);
    }
}

//! Deterministic train/val partitioning.
//!
//! Membership is assigned over every discovered candidate before any of them
//! is opened, so candidates that later turn out to have no usable labels are
//! dropped from their split instead of shifting the ratio.

use std::fmt;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::error::Deeppcb2YoloError;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// A dataset split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    /// Folder name under `images/` and `labels/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Disjoint train/val membership over a shuffled candidate list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitAssignment<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
}

impl<T> SplitAssignment<T> {
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }

    /// Total number of assigned candidates.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits in materialization order, train first.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &[T])> {
        Split::ALL.into_iter().map(move |split| (split, self.get(split)))
    }
}

/// Check that a train ratio lies in [0.0, 1.0].
pub fn validate_train_ratio(ratio: f64) -> Result<(), Deeppcb2YoloError> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(Deeppcb2YoloError::InvalidConfig {
            message: format!("train ratio must be in [0.0, 1.0], got {ratio}"),
        });
    }
    Ok(())
}

/// Number of training candidates out of `total`: floor(total × ratio).
pub fn train_count(total: usize, ratio: f64) -> usize {
    ((total as f64 * ratio).floor() as usize).min(total)
}

/// Shuffles `candidates` with a seeded RNG and cuts the result at
/// [`train_count`]. The same input order and seed always give the same
/// assignment.
pub fn split_candidates<T>(mut candidates: Vec<T>, seed: u64, ratio: f64) -> SplitAssignment<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    candidates.shuffle(&mut rng);

    let cut = train_count(candidates.len(), ratio);
    let val = candidates.split_off(cut);

    SplitAssignment {
        train: candidates,
        val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn train_count_floors() {
        assert_eq!(train_count(0, 0.8), 0);
        assert_eq!(train_count(1, 0.8), 0);
        assert_eq!(train_count(4, 0.8), 3);
        assert_eq!(train_count(10, 0.8), 8);
        assert_eq!(train_count(7, 1.0), 7);
        assert_eq!(train_count(7, 0.0), 0);
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let items: Vec<u32> = (0..50).collect();
        let first = split_candidates(items.clone(), 42, 0.8);
        let second = split_candidates(items, 42, 0.8);
        assert_eq!(first, second);
    }

    #[test]
    fn split_is_disjoint_and_covering() {
        let items: Vec<u32> = (0..23).collect();
        let split = split_candidates(items.clone(), 7, 0.8);

        assert_eq!(split.train.len(), 18);
        assert_eq!(split.val.len(), 5);

        let train: HashSet<_> = split.train.iter().copied().collect();
        let val: HashSet<_> = split.val.iter().copied().collect();
        assert!(train.is_disjoint(&val));

        let all: HashSet<u32> = train.union(&val).copied().collect();
        let expected: HashSet<u32> = items.into_iter().collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn empty_input_gives_two_empty_splits() {
        let split = split_candidates(Vec::<u32>::new(), 42, 0.8);
        assert!(split.is_empty());
        assert!(split.train.is_empty());
        assert!(split.val.is_empty());
    }

    #[test]
    fn iter_yields_train_then_val() {
        let split = split_candidates(vec![1, 2, 3, 4, 5], 1, 0.8);
        let order: Vec<_> = split.iter().map(|(s, items)| (s, items.len())).collect();
        assert_eq!(order, vec![(Split::Train, 4), (Split::Val, 1)]);
    }

    #[test]
    fn train_ratio_is_validated() {
        assert!(validate_train_ratio(0.0).is_ok());
        assert!(validate_train_ratio(0.8).is_ok());
        assert!(validate_train_ratio(1.0).is_ok());
        assert!(validate_train_ratio(-0.1).is_err());
        assert!(validate_train_ratio(1.5).is_err());
        assert!(validate_train_ratio(f64::NAN).is_err());
    }
}

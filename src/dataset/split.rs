//! Seeded train/validation partitioning.
//!
//! The splitter shuffles the whole population with a caller-supplied
//! generator and cuts once at `floor(len * ratio)`: everything before the
//! cut is validation, the rest is training. It never touches the
//! filesystem; copying or moving files according to the assignment is
//! [`crate::dataset::transfer`]'s job.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::layout::Split;
use crate::error::PrepError;

/// Partitions image ids into train and val.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatasetSplitter {
    val_ratio: f64,
}

impl DatasetSplitter {
    /// `val_ratio` is the fraction of the population assigned to `val` and
    /// must lie strictly between 0 and 1.
    pub fn new(val_ratio: f64) -> Result<Self, PrepError> {
        if !(val_ratio.is_finite() && 0.0 < val_ratio && val_ratio < 1.0) {
            return Err(PrepError::InvalidSplitParams {
                message: format!("validation ratio must be in (0.0, 1.0), got {val_ratio}"),
            });
        }
        Ok(Self { val_ratio })
    }

    pub fn val_ratio(&self) -> f64 {
        self.val_ratio
    }

    /// Number of items that go to `val` for a population of `len`.
    pub fn cut_point(&self, len: usize) -> usize {
        ((len as f64) * self.val_ratio).floor() as usize
    }

    /// Splits `population` using `rng` for the shuffle.
    ///
    /// Repeated ids are kept once, at their first position, so the result is
    /// always a partition of the distinct ids.
    pub fn split<S, R>(&self, population: &[S], rng: &mut R) -> SplitAssignment
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let mut seen = HashSet::with_capacity(population.len());
        let mut ids: Vec<String> = population
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        ids.shuffle(rng);
        let train = ids.split_off(self.cut_point(ids.len()));
        SplitAssignment::new(train, ids)
    }

    /// Splits with a fresh [`StdRng`] seeded from `seed`.
    pub fn split_seeded<S: AsRef<str>>(&self, population: &[S], seed: u64) -> SplitAssignment {
        let mut rng = StdRng::seed_from_u64(seed);
        self.split(population, &mut rng)
    }
}

/// Which split every id belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    train: Vec<String>,
    val: Vec<String>,
    lookup: HashMap<String, Split>,
}

impl SplitAssignment {
    fn new(mut train: Vec<String>, mut val: Vec<String>) -> Self {
        train.sort();
        val.sort();
        let lookup = train
            .iter()
            .map(|id| (id.clone(), Split::Train))
            .chain(val.iter().map(|id| (id.clone(), Split::Val)))
            .collect();
        Self { train, val, lookup }
    }

    pub fn get(&self, id: &str) -> Option<Split> {
        self.lookup.get(id).copied()
    }

    /// Members of one split, sorted.
    pub fn members(&self, split: Split) -> &[String] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

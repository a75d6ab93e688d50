//! Uniform random subsets of a population, drawn without replacement.
//!
//! Subsets are produced with Floyd's algorithm: for each `k` in
//! `POP - r .. POP`, draw `v` uniformly from `[0, k]` and mark `v` if it is
//! still free, otherwise mark `k` (which cannot have been marked yet since no
//! earlier step could draw a value that large). This is O(r) draws with no
//! scan over the population, and every index including 0 can be selected.

use rand::Rng;

use crate::bit_vector::BitVector;
use crate::error::Result;

/// A random subset of the sample population together with its measured size.
#[derive(Clone, Debug)]
pub struct RandomSubset {
    members: BitVector,
    requested: usize,
    cardinality: usize,
}

impl RandomSubset {
    pub fn members(&self) -> &BitVector {
        &self.members
    }

    /// Size asked for when the subset was drawn.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Number of set bits. Threshold comparisons use this, never `requested`.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
}

/// Draw `r` of `population` indices uniformly at random.
///
/// `r` larger than `population` is clamped to the whole population.
pub fn random_subset<R: Rng>(population: usize, r: usize, rng: &mut R) -> Result<RandomSubset> {
    let r = r.min(population);
    let mut members = BitVector::zeros(population)?;

    for k in population - r..population {
        let v = rng.gen_range(0..=k);
        if members.get(v) {
            members.set(k)?;
        } else {
            members.set(v)?;
        }
    }

    let cardinality = members.count_ones();

    Ok(RandomSubset {
        members,
        requested: r,
        cardinality,
    })
}

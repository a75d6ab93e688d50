//! Run-time parameters for the filter simulation and clustering pipelines.
//!
//! Population sizes, grids, thresholds, and seeds are carried in immutable
//! structs validated on construction, so every component can be exercised at
//! small scale in tests and configured at full scale from the command line.

use anyhow::{bail, Result};

/// Tolerance when deciding whether a K value lies within the inclusive maximum.
const K_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    sample_count: usize,
    repeat_count: usize,
    n_min: usize,
    n_interval: usize,
    n_max: usize,
    k_min: f64,
    k_interval: f64,
    k_max: f64,
    seed: u64,
    field_offset: usize,
}

impl SimulationParams {
    pub fn new(
        sample_count: usize,
        repeat_count: usize,
        (n_min, n_interval, n_max): (usize, usize, usize),
        (k_min, k_interval, k_max): (f64, f64, f64),
        seed: u64,
        field_offset: usize,
    ) -> Result<Self> {
        if sample_count == 0 {
            bail!("Sample count must be greater than 0");
        }

        if repeat_count == 0 {
            bail!("Repeat count must be greater than 0");
        }

        if n_interval == 0 {
            bail!("N interval must be greater than 0");
        }

        if n_min > n_max {
            bail!("Minimum N ({}) exceeds maximum N ({})", n_min, n_max);
        }

        if n_max > sample_count {
            bail!(
                "Maximum N ({}) exceeds the sample count ({})",
                n_max,
                sample_count
            );
        }

        if !(k_interval > 0.0) {
            bail!("K interval must be greater than 0");
        }

        if !(k_min >= 0.0) || k_min > k_max {
            bail!(
                "K range [{}, {}] is invalid; require 0 <= min <= max",
                k_min,
                k_max
            );
        }

        Ok(SimulationParams {
            sample_count,
            repeat_count,
            n_min,
            n_interval,
            n_max,
            k_min,
            k_interval,
            k_max,
            seed,
            field_offset,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field_offset(&self) -> usize {
        self.field_offset
    }

    /// Subset sizes N to study, ascending, `n_max` inclusive.
    pub fn n_values(&self) -> Vec<usize> {
        (self.n_min..=self.n_max).step_by(self.n_interval).collect()
    }

    /// Threshold proportions K to study, ascending, `k_max` inclusive.
    pub fn k_values(&self) -> Vec<f64> {
        (0..)
            .map(|i| self.k_min + i as f64 * self.k_interval)
            .take_while(|&k| k <= self.k_max + K_EPSILON)
            .collect()
    }

    /// Total number of random subsets the simulation will draw.
    pub fn subset_count(&self) -> usize {
        self.n_values().len() * self.repeat_count
    }
}

/// Layout of a per-sample intron store read from intron records.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreParams {
    sample_count: usize,
    intron_count: usize,
    field_offset: usize,
}

impl StoreParams {
    pub fn new(sample_count: usize, intron_count: usize, field_offset: usize) -> Result<Self> {
        if sample_count == 0 {
            bail!("Sample count must be greater than 0");
        }

        if intron_count == 0 {
            bail!("Intron count must be greater than 0");
        }

        Ok(StoreParams {
            sample_count,
            intron_count,
            field_offset,
        })
    }

    /// Number of entities (vectors) in the store.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Width in bits of each entity vector.
    pub fn intron_count(&self) -> usize {
        self.intron_count
    }

    pub fn field_offset(&self) -> usize {
        self.field_offset
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterParams {
    store: StoreParams,
    threshold: f64,
    seed: u64,
}

impl ClusterParams {
    pub fn new(store: StoreParams, threshold: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("Jaccard threshold must be in the range [0, 1]");
        }

        Ok(ClusterParams {
            store,
            threshold,
            seed,
        })
    }

    pub fn store(&self) -> &StoreParams {
        &self.store
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

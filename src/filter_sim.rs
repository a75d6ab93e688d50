//! Monte-Carlo estimate of how many junctions survive a recurrence filter.
//!
//! A junction passes the filter for a random subset of samples and a
//! threshold proportion K if it is detected in at least K times the subset's
//! measured cardinality, and in at least one sampled member. Random subsets
//! are drawn once up front for every N on the grid; junction records are then
//! streamed one at a time and tallied into a (subsets x K) counter matrix.

use std::io::{BufRead, Write};

use itertools::Itertools;
use log::info;
use rand::Rng;

use crate::bit_vector::BitVector;
use crate::error::Result;
use crate::io_utils::junction_members;
use crate::params::SimulationParams;
use crate::progress::{progress_bar, progress_spinner};
use crate::sampling::{random_subset, RandomSubset};
use crate::stats::RunningStats;

/// One output row: a random subset, a threshold, and the junctions passing.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRow {
    pub cardinality: usize,
    pub k: f64,
    pub passing: u64,
}

/// Passing counts for one (N, K) cell summarized across repeat subsets.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSummary {
    pub n: usize,
    pub k: f64,
    pub stats: RunningStats,
}

/// Return true if a junction with `hits` sampled detections passes threshold
/// `k` for a subset of `cardinality` samples.
#[inline]
pub fn passes_filter(hits: usize, cardinality: usize, k: f64) -> bool {
    hits > 0 && hits as f64 >= k * cardinality as f64
}

pub struct FilterSimulator {
    subsets: Vec<RandomSubset>,
    k_values: Vec<f64>,
    counts: Vec<u64>,
    records: usize,
    malformed: usize,
}

impl FilterSimulator {
    /// Draw every random subset on the N grid using `rng`.
    pub fn new<R: Rng>(params: &SimulationParams, rng: &mut R) -> Result<Self> {
        let n_values = params.n_values();
        let progress_bar = progress_bar(params.subset_count() as u64);

        let mut subsets = Vec::with_capacity(params.subset_count());
        for &n in &n_values {
            for _ in 0..params.repeat_count() {
                subsets.push(random_subset(params.sample_count(), n, rng)?);
                progress_bar.inc(1);
            }
        }
        progress_bar.finish();

        Ok(FilterSimulator::with_subsets(subsets, params.k_values()))
    }

    /// Build a simulator over pre-drawn subsets and threshold proportions.
    ///
    /// K values are sorted ascending and NaN values are discarded, since
    /// `process` stops at the first K a junction fails.
    pub fn with_subsets(subsets: Vec<RandomSubset>, mut k_values: Vec<f64>) -> Self {
        k_values.retain(|k| !k.is_nan());
        k_values.sort_by(f64::total_cmp);

        let counts = vec![0; subsets.len() * k_values.len()];
        FilterSimulator {
            subsets,
            k_values,
            counts,
            records: 0,
            malformed: 0,
        }
    }

    pub fn subsets(&self) -> &[RandomSubset] {
        &self.subsets
    }

    pub fn k_values(&self) -> &[f64] {
        &self.k_values
    }

    /// Number of junction records processed.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Number of records that could not be parsed and were treated as empty.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Tally one junction against every (subset, K) pair.
    pub fn process(&mut self, junction: &BitVector) {
        let num_k = self.k_values.len();
        self.records += 1;

        for (i, subset) in self.subsets.iter().enumerate() {
            let hits = subset.members().intersection_count(junction);
            if hits == 0 {
                continue;
            }

            let row = &mut self.counts[i * num_k..(i + 1) * num_k];
            for (count, &k) in row.iter_mut().zip(&self.k_values) {
                // K is ascending, so the first failure ends the row
                if !passes_filter(hits, subset.cardinality(), k) {
                    break;
                }
                *count += 1;
            }
        }
    }

    /// Stream junction records from `reader` and tally each one.
    ///
    /// Records are split on raw newlines; a record that is not valid UTF-8
    /// counts as malformed and contributes no detections.
    pub fn run<R: BufRead>(&mut self, reader: R, field_offset: usize) -> Result<()> {
        let width = self.subsets.first().map_or(0, |s| s.members().len());
        let mut junction = BitVector::zeros(width)?;

        let spinner = progress_spinner("Applying filters");
        for record in reader.split(b'\n') {
            let record = record?;
            if !junction_members(&record, field_offset, &mut junction)? {
                self.malformed += 1;
            }
            self.process(&junction);

            if self.records % 10_000 == 0 {
                spinner.set_position(self.records as u64);
            }
        }
        spinner.finish_with_message("Applied filters");

        info!(
            "Processed {} junction records ({} malformed).",
            self.records, self.malformed
        );

        Ok(())
    }

    /// Passing count for subset `subset_idx` and threshold `k_idx`.
    pub fn count(&self, subset_idx: usize, k_idx: usize) -> u64 {
        self.counts[subset_idx * self.k_values.len() + k_idx]
    }

    /// Rows in subset generation order, with K ascending within each subset.
    pub fn rows(&self) -> impl Iterator<Item = FilterRow> + '_ {
        self.subsets
            .iter()
            .enumerate()
            .cartesian_product(self.k_values.iter().enumerate())
            .map(|((i, subset), (j, &k))| FilterRow {
                cardinality: subset.cardinality(),
                k,
                passing: self.count(i, j),
            })
    }

    /// Mean and standard deviation of passing counts per (N, K) across repeats.
    pub fn summary(&self) -> Vec<CellSummary> {
        let mut cells = Vec::new();
        let by_n = self
            .subsets
            .iter()
            .enumerate()
            .chunk_by(|(_, subset)| subset.requested());

        for (n, group) in &by_n {
            let indices: Vec<usize> = group.map(|(i, _)| i).collect();
            for (j, &k) in self.k_values.iter().enumerate() {
                let mut stats = RunningStats::new();
                for &i in &indices {
                    stats.push(self.count(i, j) as f64);
                }
                cells.push(CellSummary { n, k, stats });
            }
        }

        cells
    }

    /// Write `cardinality<TAB>K<TAB>passing` rows.
    pub fn write_rows<W: Write>(&self, writer: &mut W) -> Result<()> {
        for row in self.rows() {
            writeln!(writer, "{}\t{:.6}\t{}", row.cardinality, row.k, row.passing)?;
        }

        Ok(())
    }

    /// Write `N<TAB>K<TAB>mean<TAB>std_dev<TAB>repeats` rows.
    pub fn write_summary<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "n\tk\tmean\tstd_dev\trepeats")?;
        for cell in self.summary() {
            writeln!(
                writer,
                "{}\t{:.6}\t{:.4}\t{:.4}\t{}",
                cell.n,
                cell.k,
                cell.stats.mean(),
                cell.stats.std_dev(),
                cell.stats.count()
            )?;
        }

        Ok(())
    }
}

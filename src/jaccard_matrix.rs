//! Pairwise Jaccard similarity between every pair of entities in a store.
//!
//! Rows are computed in parallel and written in ascending order of the first
//! entity, then the second, covering each unordered pair once (diagonal
//! included). Similarities are written with 15 decimals; a pair whose union
//! is empty has no defined similarity and is written as `NA`.

use std::io::Write;

use rayon::prelude::*;

use crate::bit_vector::BitVectorStore;
use crate::error::Result;
use crate::progress::progress_bar;

/// Similarities of entity `i` against entities `i..`, `None` where the union
/// is empty.
pub fn jaccard_row(store: &BitVectorStore, i: usize) -> Vec<Option<f64>> {
    (i..store.len())
        .map(|j| match store.union_count(i, j) {
            0 => None,
            union => Some(store.intersection_count(i, j) as f64 / union as f64),
        })
        .collect()
}

/// Write `i<TAB>j<TAB>jaccard` for every pair `i <= j`.
///
/// Rows are computed in blocks so that only a bounded number are held in
/// memory before being written.
pub fn write_jaccard_matrix<W: Write>(store: &BitVectorStore, writer: &mut W, block_size: usize) -> Result<usize> {
    let n = store.len();
    let block_size = block_size.max(1);
    let progress_bar = progress_bar(n as u64);

    let mut pairs = 0;
    for block_start in (0..n).step_by(block_size) {
        let block_end = (block_start + block_size).min(n);
        let rows: Vec<Vec<Option<f64>>> = (block_start..block_end)
            .into_par_iter()
            .map(|i| jaccard_row(store, i))
            .collect();

        for (offset, row) in rows.iter().enumerate() {
            let i = block_start + offset;
            for (d, similarity) in row.iter().enumerate() {
                match similarity {
                    Some(similarity) => writeln!(writer, "{}\t{}\t{:.15}", i, i + d, similarity)?,
                    None => writeln!(writer, "{}\t{}\tNA", i, i + d)?,
                }
            }
            pairs += row.len();
        }
        progress_bar.inc((block_end - block_start) as u64);
    }
    progress_bar.finish();

    Ok(pairs)
}

//! Main entry point for the jxset application.
//!
//! This file handles command-line parsing, logging setup, and orchestrates the
//! two analyses built on packed membership bit vectors: Monte-Carlo estimation
//! of how many junctions survive a recurrence filter as the number of samples
//! N and threshold proportion K vary, and greedy Jaccard clustering of samples
//! by the introns they detect. Records are read from stdin and results written
//! to stdout; diagnostics go to stderr.

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use num_format::{Locale, ToFormattedString};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::bit_vector::{words_for, BitVectorStore, Word};
use crate::cli::{Cli, ClusterArgs, Command, JaccardArgs, SimulateArgs};
use crate::cluster::{ClusterSummary, GreedyClusterer};
use crate::filter_sim::FilterSimulator;
use crate::io_utils::load_store;
use crate::jaccard_matrix::write_jaccard_matrix;
use crate::logging::setup_logger;
use crate::params::{ClusterParams, SimulationParams, StoreParams};

mod cli;
pub mod bit_vector;
pub mod cluster;
pub mod error;
pub mod filter_sim;
pub mod io_utils;
pub mod jaccard_matrix;
pub mod logging;
pub mod params;
pub mod progress;
pub mod sampling;
pub mod stats;

/// Common initialization required by all commands.
fn init(threads: usize) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    info!("{} v{}", env!("CARGO_PKG_NAME"), VERSION);
    info!("{}", env::args().collect::<Vec<String>>().join(" "));

    info!("Using {} threads.", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    Ok(())
}

/// Report the packed buffer size a pipeline is about to allocate.
fn log_memory(what: &str, bytes: usize) {
    info!(
        "Peak memory for {}: {} bytes ({:.2} GiB).",
        what,
        bytes.to_formatted_string(&Locale::en),
        bytes as f64 / (1u64 << 30) as f64
    );
}

/// Draw random subsets, stream junction records from `reader`, and write the
/// per-(subset, K) passing counts to `writer`.
fn run_simulation<R: BufRead, W: Write>(params: &SimulationParams, reader: R, writer: &mut W) -> Result<FilterSimulator> {
    info!("Reservoir sampling to obtain random subsets...");
    let mut rng = Xoshiro256StarStar::seed_from_u64(params.seed());
    let mut simulator = FilterSimulator::new(params, &mut rng)?;

    info!("Reading junctions and applying filters...");
    simulator.run(reader, params.field_offset())?;

    info!("Dumping output...");
    simulator.write_rows(writer)?;

    Ok(simulator)
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let params = args.params()?;
    info!(
        "Simulating filters over {} samples: {} subset sizes x {} repeats, {} thresholds, seed {}.",
        params.sample_count(),
        params.n_values().len(),
        params.repeat_count(),
        params.k_values().len(),
        params.seed()
    );

    // one vector per random subset plus the junction being processed
    let bytes = (params.subset_count() + 1) * words_for(params.sample_count()) * size_of::<Word>();
    log_memory("random subsets", bytes);

    let mut writer = BufWriter::new(io::stdout().lock());
    let simulator = run_simulation(&params, io::stdin().lock(), &mut writer)?;
    writer.flush()?;

    if let Some(path) = &args.summary {
        info!("Writing summary statistics to {}.", path.display());
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut summary_writer = BufWriter::new(file);
        simulator.write_summary(&mut summary_writer)?;
        summary_writer.flush()?;
    }

    Ok(())
}

/// Load the per-sample intron store laid out by `params` from `reader`.
fn load_sample_store<R: BufRead>(params: &StoreParams, reader: R) -> Result<BitVectorStore> {
    log_memory(
        "sample bit vectors",
        BitVectorStore::bytes_required(params.sample_count(), params.intron_count()),
    );

    info!("Loading introns...");
    let (store, summary) = load_store(reader, params).context("Failed to load intron records")?;
    info!(
        "Loaded {} intron records ({} malformed).",
        summary.records.to_formatted_string(&Locale::en),
        summary.malformed.to_formatted_string(&Locale::en)
    );

    Ok(store)
}

/// Load intron records from `reader` and write greedy clusters to `writer`.
fn run_clustering<R: BufRead, W: Write>(params: &ClusterParams, reader: R, writer: &mut W) -> Result<ClusterSummary> {
    let store = load_sample_store(params.store(), reader)?;

    info!("Clustering...");
    let mut rng = Xoshiro256StarStar::seed_from_u64(params.seed());
    let mut clusterer = GreedyClusterer::new(&store, params.threshold());
    let summary = clusterer.write_all(&mut rng, writer)?;

    Ok(summary)
}

fn cluster(args: &ClusterArgs) -> Result<()> {
    let params = args.params()?;
    info!(
        "Clustering {} samples over {} introns with Jaccard threshold {} and seed {}.",
        params.store().sample_count(),
        params.store().intron_count(),
        params.threshold(),
        params.seed()
    );

    let mut writer = BufWriter::new(io::stdout().lock());
    let summary = run_clustering(&params, io::stdin().lock(), &mut writer)?;
    writer.flush()?;

    info!(
        "Formed {} clusters ({} singletons); {} samples had no introns.",
        summary.clusters, summary.singletons, summary.degenerate
    );

    Ok(())
}

fn jaccard(args: &JaccardArgs) -> Result<()> {
    let params = args.store.params()?;
    let store = load_sample_store(&params, io::stdin().lock())?;

    info!("Computing pairwise Jaccard similarities...");
    let mut writer = BufWriter::new(io::stdout().lock());
    let pairs = write_jaccard_matrix(&store, &mut writer, args.block_size)?;
    writer.flush()?;

    info!("Wrote {} sample pairs.", pairs.to_formatted_string(&Locale::en));

    Ok(())
}

fn main() -> Result<()> {
    let start = Instant::now();

    let args = Cli::parse();

    setup_logger(args.log_file.as_deref())?;

    init(args.threads)?;

    match &args.command {
        Command::Simulate(sim_args) => simulate(sim_args)?,
        Command::Cluster(cluster_args) => cluster(cluster_args)?,
        Command::Jaccard(jaccard_args) => jaccard(jaccard_args)?,
    }

    info!("Elapsed time (sec): {:.2}", start.elapsed().as_secs_f32());
    info!("Done.");

    Ok(())
}

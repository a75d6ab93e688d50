//! Command-line interface definition for the jxset application.
//!
//! Three subcommands share the bit-vector engine: `simulate` estimates how many
//! junctions survive a recurrence filter over random sample subsets, `cluster`
//! greedily groups samples by the Jaccard similarity of their intron sets, and
//! `jaccard` writes the full pairwise similarity matrix. Input records are
//! read from stdin and results are written to stdout. The CLI output is styled
//! using the `anstyle` crate for improved readability.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::params::{ClusterParams, SimulationParams, StoreParams};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(styles=get_styles())]
#[command(disable_help_subcommand = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Number of threads to use
    #[arg(short, long, global = true, default_value_t = 1, value_parser = validate_threads)]
    pub threads: usize,

    /// Also write diagnostic messages to this file
    #[arg(long, global = true, value_parser = clap::value_parser!(PathBuf))]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Count junctions passing a recurrence filter over random subsets of samples
    Simulate(SimulateArgs),

    /// Greedily cluster samples by Jaccard similarity of their intron sets
    Cluster(ClusterArgs),

    /// Write pairwise Jaccard similarity between all samples
    Jaccard(JaccardArgs),
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Seed for the random number generator
    #[arg(long)]
    pub seed: u64,

    /// Total number of samples junctions may be detected in
    #[arg(long, help_heading = "Population", default_value_t = 21506)]
    pub samples: usize,

    /// Number of random subsets drawn for each value of N
    #[arg(long, help_heading = "Sampling grid", default_value_t = 1)]
    pub repeats: usize,

    /// Smallest subset size N
    #[arg(long, help_heading = "Sampling grid", default_value_t = 500)]
    pub n_min: usize,

    /// Step between successive subset sizes
    #[arg(long, help_heading = "Sampling grid", default_value_t = 500)]
    pub n_interval: usize,

    /// Largest subset size N (inclusive)
    #[arg(long, help_heading = "Sampling grid", default_value_t = 21500)]
    pub n_max: usize,

    /// Smallest threshold proportion K
    #[arg(long, help_heading = "Threshold grid", default_value_t = 0.0)]
    pub k_min: f64,

    /// Step between successive threshold proportions
    #[arg(long, help_heading = "Threshold grid", default_value_t = 0.025)]
    pub k_interval: f64,

    /// Largest threshold proportion K (inclusive)
    #[arg(long, help_heading = "Threshold grid", default_value_t = 0.075)]
    pub k_max: f64,

    /// Number of tab-delimited fields preceding the sample index list
    #[arg(long, help_heading = "Input", default_value_t = 6)]
    pub field_offset: usize,

    /// Write mean and standard deviation of passing counts per (N, K) to this file
    #[arg(long, help_heading = "Output", value_parser = clap::value_parser!(PathBuf))]
    pub summary: Option<PathBuf>,
}

impl SimulateArgs {
    pub fn params(&self) -> Result<SimulationParams> {
        SimulationParams::new(
            self.samples,
            self.repeats,
            (self.n_min, self.n_interval, self.n_max),
            (self.k_min, self.k_interval, self.k_max),
            self.seed,
            self.field_offset,
        )
    }
}

/// Population layout shared by `cluster` and `jaccard`.
#[derive(Args)]
pub struct StoreArgs {
    /// Number of samples (entities to compare)
    #[arg(long, help_heading = "Population", default_value_t = 3000)]
    pub samples: usize,

    /// Number of introns (one per input line)
    #[arg(long, help_heading = "Population", default_value_t = 11_898_514)]
    pub introns: usize,

    /// Number of tab-delimited fields preceding the sample index list
    #[arg(long, help_heading = "Input", default_value_t = 3)]
    pub field_offset: usize,
}

impl StoreArgs {
    pub fn params(&self) -> Result<StoreParams> {
        StoreParams::new(self.samples, self.introns, self.field_offset)
    }
}

#[derive(Args)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Minimum Jaccard similarity to the pivot for joining its cluster
    #[arg(long, default_value_t = 0.8, value_parser = validate_threshold)]
    pub threshold: f64,

    /// Seed for the random number generator
    #[arg(long, default_value_t = 5)]
    pub seed: u64,
}

impl ClusterArgs {
    pub fn params(&self) -> Result<ClusterParams> {
        ClusterParams::new(self.store.params()?, self.threshold, self.seed)
    }
}

#[derive(Args)]
pub struct JaccardArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Number of rows computed in parallel before being written
    #[arg(long, default_value_t = 64)]
    pub block_size: usize,
}

fn validate_threshold(threshold: &str) -> Result<f64, String> {
    let threshold: f64 = threshold
        .parse()
        .map_err(|_| format!("`{threshold}` isn't a valid threshold"))?;

    if !(0.0..=1.0).contains(&threshold) {
        return Err("Threshold must be in the range [0, 1]".to_string());
    }

    Ok(threshold)
}

fn validate_threads(threads: &str) -> Result<usize, String> {
    let threads: usize = threads
        .parse()
        .map_err(|_| format!("`{threads}` isn't a valid value"))?;

    if !(1..=1024).contains(&threads) {
        return Err("Threads  must be in the range [1, 1024]".to_string());
    }

    Ok(threads)
}

fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

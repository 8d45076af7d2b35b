// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the mzsweep command-line interface.
//!
//! `sweep` runs the full `(w, k)` grid against an external index engine.
//! `evaluate` compares a single candidate mapping with the ground truth.
//! `matrix` re-derives metric tables from a saved `results.json`, and
//! `strategies` lines up one metric from two result directories so two
//! index variants can be compared at a fixed window size.

pub mod display;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mzsweep",
    about = "Accuracy/performance sweeps for minimizer sequence indexes",
    version
)]
pub struct Cli {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build, query and score the index for every (w, k) pair
    Sweep {
        /// Reference sequence (FASTA)
        reference: PathBuf,

        /// Query workload (reads)
        queries: PathBuf,

        /// Precomputed exhaustive-search mapping (4 metadata columns)
        ground_truth: PathBuf,

        /// Output directory; index/ and results/ are created inside
        output: PathBuf,

        /// JSON file with grid, engine and parallelism settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Smallest window size (overrides the config file)
        #[arg(long)]
        w_min: Option<usize>,

        /// Largest window size (overrides the config file)
        #[arg(long)]
        w_max: Option<usize>,

        /// Kill a build or query stage after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Cells evaluated concurrently (1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Compare one candidate mapping against the ground truth
    Evaluate {
        /// Exhaustive-search mapping (4 metadata columns)
        ground_truth: PathBuf,

        /// Index query output (2 metadata columns)
        candidate: PathBuf,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-derive metric matrices from a results.json
    Matrix {
        /// results.json written by a sweep
        results: PathBuf,

        /// Directory for the matrix tables (default: next to results.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print this metric as a table
        #[arg(long)]
        show: Option<String>,
    },

    /// Compare one metric between two result directories at a fixed w
    Strategies {
        /// Metric name or label (e.g. false_positive_rate, FPR)
        metric: String,

        /// Window size row to compare
        #[arg(short)]
        w: usize,

        /// Results directory of the first strategy
        first: PathBuf,

        /// Results directory of the second strategy
        second: PathBuf,
    },
}

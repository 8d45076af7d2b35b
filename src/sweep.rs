// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Grid sweep driver.
//!
//! For every valid `(w, k)` pair: build an index, time it, read its size and
//! build report, run the query workload against it, time that, then compare
//! the candidate mapping with the ground truth. Each pair becomes one
//! immutable [`CellResult`].
//!
//! # Failure policy
//!
//! The first failing cell aborts the sweep. Its error is wrapped with the pair
//! ([`SweepError::Cell`]) and the cells that already finished are flushed to
//! `partial_results.{csv,json}` before the error is returned, so a late
//! failure in a long sweep does not throw away hours of finished work.
//!
//! # Ordering
//!
//! Cells are evaluated in `(w, k)` order when sequential. With
//! `parallelism > 1` they finish in any order and are sorted before writing,
//! so reports look the same either way.

use crate::compare::{compare, Accuracy};
use crate::config::{OutputLayout, SweepConfig};
use crate::engine::{BuildReport, IndexEngine, ProcessEngine};
use crate::error::{Result, SweepError};
use crate::grid::{GridBounds, ParamPair};
use crate::mapping::{parse_mapping, HitSet, CANDIDATE, GROUND_TRUTH};
use crate::report;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(feature = "parallel")]
use indicatif::{ProgressBar, ProgressStyle};

/// Evaluation outcome of one `(w, k)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellResult {
    pub pair: ParamPair,
    /// Stored length over original length.
    pub reduction: f64,
    pub original_len: u64,
    pub minimizer_len: u64,
    /// Wall-clock seconds of the build stage.
    pub build_secs: f64,
    /// Wall-clock seconds of the query stage.
    pub query_secs: f64,
    /// Size of the index artifact in bytes.
    pub index_bytes: u64,
    pub accuracy: Accuracy,
}

/// A finished sweep.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub grid: GridBounds,
    /// Cells in `(w, k)` order.
    pub cells: Vec<CellResult>,
    /// Every table written under `results/`.
    pub written: Vec<PathBuf>,
}

/// Drives an [`IndexEngine`] over a grid.
pub struct Sweep<E: IndexEngine> {
    config: SweepConfig,
    layout: OutputLayout,
    engine: E,
    progress: bool,
}

impl Sweep<ProcessEngine> {
    /// A sweep that spawns the configured engine commands.
    pub fn with_process_engine(config: SweepConfig) -> Self {
        let engine = ProcessEngine::new(config.engine.clone());
        Sweep::new(config, engine)
    }
}

impl<E: IndexEngine> Sweep<E> {
    pub fn new(config: SweepConfig, engine: E) -> Self {
        let layout = config.layout();
        Sweep {
            config,
            layout,
            engine,
            progress: false,
        }
    }

    /// Show a progress bar on stderr (needs the `parallel` feature).
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run every cell and write the reports.
    pub fn run(&self) -> Result<SweepOutcome> {
        self.config.validate()?;
        self.layout.create()?;
        let stale = report::clear_reports(&self.layout)?;
        if !stale.is_empty() {
            log::info!("removed {} tables from an earlier run", stale.len());
        }

        let truth = parse_mapping(&self.config.ground_truth, GROUND_TRUTH)?;
        log::info!(
            "ground truth: {} queries from {}",
            truth.len(),
            self.config.ground_truth.display()
        );
        if truth.is_empty() {
            return Err(SweepError::EmptyInput);
        }

        let pairs = self.config.grid.pairs();
        log::info!(
            "sweeping {} cells (w={}..={}, k={}..={})",
            pairs.len(),
            self.config.grid.w_min,
            self.config.grid.w_max,
            self.config.grid.k_min,
            self.config.grid.k_max
        );

        let mut cells = match self.evaluate_all(&pairs, &truth) {
            Ok(cells) => cells,
            Err((err, mut done)) => {
                done.sort_by_key(|c| c.pair);
                self.flush_partial(&done);
                return Err(err);
            }
        };
        cells.sort_by_key(|c| c.pair);

        let written = report::write_reports(&self.layout, &self.config.grid, &cells)?;
        log::info!("wrote {} tables to {}", written.len(), self.layout.results_dir.display());

        Ok(SweepOutcome {
            grid: self.config.grid,
            cells,
            written,
        })
    }

    fn flush_partial(&self, done: &[CellResult]) {
        if done.is_empty() {
            return;
        }
        match report::write_partial(&self.layout, &self.config.grid, done) {
            Ok(paths) => log::warn!(
                "sweep aborted; {} completed cells flushed to {}",
                done.len(),
                paths[0].display()
            ),
            Err(e) => log::error!("sweep aborted and partial flush failed: {}", e),
        }
    }

    /// Evaluate every pair. On failure returns the error and the cells
    /// finished so far.
    fn evaluate_all(
        &self,
        pairs: &[ParamPair],
        truth: &[HitSet],
    ) -> std::result::Result<Vec<CellResult>, (SweepError, Vec<CellResult>)> {
        #[cfg(feature = "parallel")]
        if self.config.parallelism > 1 {
            return self.evaluate_parallel(pairs, truth);
        }

        #[cfg(not(feature = "parallel"))]
        if self.config.parallelism > 1 {
            log::warn!("built without the `parallel` feature; running sequentially");
        }

        self.evaluate_sequential(pairs, truth)
    }

    fn evaluate_sequential(
        &self,
        pairs: &[ParamPair],
        truth: &[HitSet],
    ) -> std::result::Result<Vec<CellResult>, (SweepError, Vec<CellResult>)> {
        #[cfg(feature = "parallel")]
        let pb = self.progress_bar(pairs.len());

        let mut cells = Vec::with_capacity(pairs.len());
        for &pair in pairs {
            #[cfg(feature = "parallel")]
            pb.set_message(pair.to_string());

            match self.evaluate(pair, truth) {
                Ok(cell) => cells.push(cell),
                Err(err) => {
                    #[cfg(feature = "parallel")]
                    pb.abandon_with_message(format!("failed at {}", pair));
                    return Err((err.in_cell(pair), cells));
                }
            }

            #[cfg(feature = "parallel")]
            pb.inc(1);
        }

        #[cfg(feature = "parallel")]
        pb.finish_with_message(format!("{} cells", cells.len()));
        Ok(cells)
    }

    #[cfg(feature = "parallel")]
    fn evaluate_parallel(
        &self,
        pairs: &[ParamPair],
        truth: &[HitSet],
    ) -> std::result::Result<Vec<CellResult>, (SweepError, Vec<CellResult>)> {
        use parking_lot::Mutex;
        use rayon::prelude::*;

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                let err = SweepError::Config {
                    reason: format!("Failed to start worker pool: {}", e),
                };
                return Err((err, Vec::new()));
            }
        };

        let pb = self.progress_bar(pairs.len());
        let done = Mutex::new(Vec::with_capacity(pairs.len()));

        let result = pool.install(|| {
            pairs.par_iter().try_for_each(|&pair| {
                let cell = self.evaluate(pair, truth).map_err(|e| e.in_cell(pair))?;
                done.lock().push(cell);
                pb.inc(1);
                Ok(())
            })
        });

        let cells = done.into_inner();
        match result {
            Ok(()) => {
                pb.finish_with_message(format!("{} cells", cells.len()));
                Ok(cells)
            }
            Err(err) => {
                pb.abandon_with_message("failed");
                Err((err, cells))
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:<12} [{bar:40.cyan/dim}] {pos}/{len} {msg}",
        ) {
            pb.set_style(style.progress_chars("━━╸"));
        }
        pb.set_prefix("Sweeping");
        pb
    }

    /// Build, query and compare one pair.
    pub fn evaluate(&self, pair: ParamPair, truth: &[HitSet]) -> Result<CellResult> {
        let index = self.layout.index_artifact(pair);
        let mapping = self.layout.candidate_mapping(pair);

        remove_stale(&index)?;
        remove_stale(&mapping)?;

        log::info!("{}: building", pair);
        let started = Instant::now();
        let stdout = self.engine.build(&self.config.reference, pair, &index)?;
        let build_secs = started.elapsed().as_secs_f64();

        let build = BuildReport::parse(&stdout)?;
        let index_bytes = fs::metadata(&index)
            .map_err(|e| {
                SweepError::io(
                    format!("Build stage did not write index artifact {}", index.display()),
                    e,
                )
            })?
            .len();

        log::info!("{}: querying", pair);
        let started = Instant::now();
        self.engine.query(&index, &self.config.queries, &mapping)?;
        let query_secs = started.elapsed().as_secs_f64();

        if !mapping.is_file() {
            return Err(SweepError::io(
                format!("Query stage did not write candidate mapping {}", mapping.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let candidate = parse_mapping(&mapping, CANDIDATE)?;
        let accuracy = compare(truth, &candidate)?;

        log::info!(
            "{}: R={:.3} FN={:.3} FP={:.3} FPR={:.3} ({:.2}s + {:.2}s)",
            pair,
            build.reduction(),
            accuracy.avg_false_negatives,
            accuracy.avg_false_positives,
            accuracy.false_positive_rate,
            build_secs,
            query_secs
        );

        Ok(CellResult {
            pair,
            reduction: build.reduction(),
            original_len: build.original_len,
            minimizer_len: build.minimizer_len,
            build_secs,
            query_secs,
            index_bytes,
            accuracy,
        })
    }
}

/// Delete an artifact left by an earlier run. Stages must write theirs fresh.
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SweepError::io(
            format!("Failed to remove stale {}", path.display()),
            e,
        )),
    }
}

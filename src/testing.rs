//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical implementations of test helpers to avoid duplication.

#![doc(hidden)]

use crate::compare::Accuracy;
use crate::engine::IndexEngine;
use crate::error::{Result, SweepError};
use crate::grid::ParamPair;
use crate::sweep::CellResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Build report printed by [`FakeEngine`]: reduction 0.25.
pub const FAKE_BUILD_REPORT: &str = "Reading reference\n\
Original sequence length: 4000\n\
Minimizer sequence length (indices stored): 1000\n";

/// Size of the artifact [`FakeEngine`] writes (8 KiB and change).
pub const FAKE_INDEX_BYTES: usize = 8 * 1024 + 100;

/// Create a cell with fixed, recognisable values.
///
/// reduction 0.25, 8 KiB index, FN 0.5, FP 1.25, FPR 0.5.
pub fn make_cell(w: usize, k: usize) -> CellResult {
    CellResult {
        pair: ParamPair::new(w, k).expect("valid test pair"),
        reduction: 0.25,
        original_len: 4000,
        minimizer_len: 1000,
        build_secs: 0.5 + w as f64 / 100.0,
        query_secs: 0.1 + k as f64 / 100.0,
        index_bytes: FAKE_INDEX_BYTES as u64,
        accuracy: Accuracy {
            queries: 4,
            avg_false_negatives: 0.5,
            avg_false_positives: 1.25,
            false_positive_rate: 0.5,
            queries_with_false_negatives: 2,
            false_negative_rate: 0.5,
        },
    }
}

/// Write a reference, a query workload and the given ground truth into `dir`.
///
/// Returns `(reference, queries, ground_truth)` paths.
pub fn write_inputs(dir: &Path, ground_truth: &str) -> (PathBuf, PathBuf, PathBuf) {
    let reference = dir.join("reference.fa");
    let queries = dir.join("reads.fq");
    let truth = dir.join("truth.map");
    fs::write(&reference, ">chr\nACGTACGTTTGACCA\n").expect("write reference");
    fs::write(&queries, ">q1\nACGTA\n>q2\nTTGAC\n").expect("write queries");
    fs::write(&truth, ground_truth).expect("write ground truth");
    (reference, queries, truth)
}

/// In-process engine that writes a fixed mapping for every pair.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    mapping: String,
    fail_build_at: Option<ParamPair>,
}

impl FakeEngine {
    pub fn new(mapping: &str) -> Self {
        FakeEngine {
            mapping: mapping.to_string(),
            fail_build_at: None,
        }
    }

    /// Print a report without the minimizer counter for `pair`.
    pub fn failing_build_at(mut self, pair: ParamPair) -> Self {
        self.fail_build_at = Some(pair);
        self
    }
}

impl IndexEngine for FakeEngine {
    fn build(&self, _reference: &Path, pair: ParamPair, index: &Path) -> Result<String> {
        fs::write(index, vec![0u8; FAKE_INDEX_BYTES])
            .map_err(|e| SweepError::io("fake build", e))?;
        if self.fail_build_at == Some(pair) {
            return Ok("Original sequence length: 4000\n".to_string());
        }
        Ok(FAKE_BUILD_REPORT.to_string())
    }

    fn query(&self, _index: &Path, _queries: &Path, output: &Path) -> Result<()> {
        fs::write(output, &self.mapping).map_err(|e| SweepError::io("fake query", e))
    }
}

// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Correctness comparator: ground truth vs. candidate hit sets.
//!
//! Streams are aligned by position. Query *i* of the ground truth is compared
//! with query *i* of the candidate, so both streams must have the same length.
//! A length mismatch means a query went missing somewhere upstream, and
//! zipping would quietly compare the wrong queries from that point on.
//! We refuse instead.
//!
//! Per query:
//!
//! ```text
//! FN_i = |truth_i \ candidate_i|     (hits the index missed)
//! FP_i = |candidate_i \ truth_i|     (hits the index made up)
//! ```

use crate::error::{Result, SweepError};
use crate::mapping::HitSet;
use serde::{Deserialize, Serialize};

/// Comparison of one aligned query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    pub false_negatives: usize,
    pub false_positives: usize,
    /// `|truth_i ∩ candidate_i|`
    pub shared: usize,
}

impl QueryOutcome {
    pub fn of(truth: &HitSet, candidate: &HitSet) -> Self {
        let shared = truth.intersection(candidate).count();
        QueryOutcome {
            false_negatives: truth.len() - shared,
            false_positives: candidate.len() - shared,
            shared,
        }
    }
}

/// Aggregate accuracy of a candidate stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// Number of aligned queries (N).
    pub queries: usize,
    /// Σ FN_i / N
    pub avg_false_negatives: f64,
    /// Σ FP_i / N
    pub avg_false_positives: f64,
    /// |{i : FP_i > 0}| / N
    pub false_positive_rate: f64,
    /// |{i : FN_i > 0}|, i.e. queries whose truth is not a subset of the candidate.
    pub queries_with_false_negatives: usize,
    /// |{i : FN_i > 0}| / N
    pub false_negative_rate: f64,
}

/// Compare each aligned query. Fails on a length mismatch.
pub fn per_query(truth: &[HitSet], candidate: &[HitSet]) -> Result<Vec<QueryOutcome>> {
    if truth.len() != candidate.len() {
        return Err(SweepError::Misalignment {
            truth: truth.len(),
            candidate: candidate.len(),
        });
    }
    Ok(truth
        .iter()
        .zip(candidate)
        .map(|(t, c)| QueryOutcome::of(t, c))
        .collect())
}

/// Aggregate false-negative / false-positive statistics over all queries.
pub fn compare(truth: &[HitSet], candidate: &[HitSet]) -> Result<Accuracy> {
    let outcomes = per_query(truth, candidate)?;
    if outcomes.is_empty() {
        return Err(SweepError::EmptyInput);
    }

    let n = outcomes.len();
    let total_fn: usize = outcomes.iter().map(|o| o.false_negatives).sum();
    let total_fp: usize = outcomes.iter().map(|o| o.false_positives).sum();
    let with_fp = outcomes.iter().filter(|o| o.false_positives > 0).count();
    let with_fn = outcomes.iter().filter(|o| o.false_negatives > 0).count();

    let nf = n as f64;
    Ok(Accuracy {
        queries: n,
        avg_false_negatives: total_fn as f64 / nf,
        avg_false_positives: total_fp as f64 / nf,
        false_positive_rate: with_fp as f64 / nf,
        queries_with_false_negatives: with_fn,
        false_negative_rate: with_fn as f64 / nf,
    })
}

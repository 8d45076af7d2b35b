// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The `(w, k)` parameter grid.
//!
//! A [`ParamPair`] can only be built with `MIN_K <= k < w`, so every pair the
//! sweep ever sees is valid by construction. [`GridBounds`] enumerates pairs in
//! report order: increasing `w`, then increasing `k` within `w`.

use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest substring length the grid will evaluate.
pub const MIN_K: usize = 3;

/// A validated `(w, k)` pair with `MIN_K <= k < w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct ParamPair {
    // Field order matters: derived Ord sorts by w first, then k.
    w: usize,
    k: usize,
}

#[derive(Deserialize)]
struct RawPair {
    w: usize,
    k: usize,
}

impl TryFrom<RawPair> for ParamPair {
    type Error = SweepError;

    fn try_from(raw: RawPair) -> Result<Self> {
        ParamPair::new(raw.w, raw.k)
    }
}

impl ParamPair {
    pub fn new(w: usize, k: usize) -> Result<Self> {
        if k < MIN_K {
            return Err(SweepError::InvalidGrid {
                reason: format!("k={} is below the minimum of {}", k, MIN_K),
            });
        }
        if k >= w {
            return Err(SweepError::InvalidGrid {
                reason: format!("k={} must be smaller than w={}", k, w),
            });
        }
        Ok(ParamPair { w, k })
    }

    pub fn w(&self) -> usize {
        self.w
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl fmt::Display for ParamPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(w={}, k={})", self.w, self.k)
    }
}

/// Inclusive bounds of a sweep.
///
/// Rows are `w_min..=w_max`; matrix columns are `k_min..=k_max`. A cell is
/// evaluated only where `k < w`, so the upper-right triangle stays empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub w_min: usize,
    pub w_max: usize,
    pub k_min: usize,
    pub k_max: usize,
}

impl Default for GridBounds {
    fn default() -> Self {
        GridBounds {
            w_min: 4,
            w_max: 11,
            k_min: MIN_K,
            k_max: 10,
        }
    }
}

impl GridBounds {
    /// Bounds covering `w_min..=w_max` with the widest useful column range
    /// (`MIN_K..w_max`).
    pub fn for_windows(w_min: usize, w_max: usize) -> Result<Self> {
        let bounds = GridBounds {
            w_min,
            w_max,
            k_min: MIN_K,
            k_max: w_max.saturating_sub(1),
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check that the bounds are ordered and produce at least one pair.
    pub fn validate(&self) -> Result<()> {
        if self.w_min > self.w_max {
            return Err(SweepError::InvalidGrid {
                reason: format!("w range {}..={} is empty", self.w_min, self.w_max),
            });
        }
        if self.k_min < MIN_K {
            return Err(SweepError::InvalidGrid {
                reason: format!("k_min={} is below the minimum of {}", self.k_min, MIN_K),
            });
        }
        if self.k_min > self.k_max {
            return Err(SweepError::InvalidGrid {
                reason: format!("k range {}..={} is empty", self.k_min, self.k_max),
            });
        }
        if self.pairs().is_empty() {
            return Err(SweepError::InvalidGrid {
                reason: format!(
                    "no pair with k < w in w={}..={}, k={}..={}",
                    self.w_min, self.w_max, self.k_min, self.k_max
                ),
            });
        }
        Ok(())
    }

    /// Row labels of every metric matrix.
    pub fn w_values(&self) -> Vec<usize> {
        (self.w_min..=self.w_max).collect()
    }

    /// Column labels of every metric matrix.
    pub fn k_values(&self) -> Vec<usize> {
        (self.k_min..=self.k_max).collect()
    }

    /// Every valid pair, ordered by `w` then `k`.
    pub fn pairs(&self) -> Vec<ParamPair> {
        let mut pairs = Vec::new();
        for w in self.w_min..=self.w_max {
            for k in self.k_min..=self.k_max.min(w.saturating_sub(1)) {
                if let Ok(pair) = ParamPair::new(w, k) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }

    /// Whether `(w, k)` is a cell this grid evaluates.
    pub fn contains(&self, w: usize, k: usize) -> bool {
        (self.w_min..=self.w_max).contains(&w)
            && (self.k_min..=self.k_max).contains(&k)
            && k < w
    }
}

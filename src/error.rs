// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the sweep harness.
//!
//! Every failure is fatal to the cell it happens in, and a failed cell aborts
//! the sweep. A wrong number in a report is worse than a missing one, so
//! nothing here is retried or papered over. Variants carry enough context to
//! say *what* broke, and [`SweepError::Cell`] wraps them with the `(w, k)`
//! pair that was being evaluated.

use crate::grid::ParamPair;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which external engine stage a subprocess error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Query => write!(f, "query"),
        }
    }
}

/// Error type for everything the harness can fail on.
#[derive(Debug)]
pub enum SweepError {
    /// A mapping line could not be tokenized.
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// Ground truth and candidate streams have different query counts.
    Misalignment { truth: usize, candidate: usize },
    /// Zero queries to average over.
    EmptyInput,
    /// A counter was missing or non-numeric in the build stage's report.
    BuildReport {
        counter: &'static str,
        reason: String,
    },
    /// An engine stage exited unsuccessfully (or could not be spawned).
    Subprocess {
        stage: Stage,
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    /// An engine stage ran past its time limit and was killed.
    Timeout {
        stage: Stage,
        command: String,
        limit: Duration,
    },
    /// Grid bounds that cannot produce a valid `k < w` pair.
    InvalidGrid { reason: String },
    /// Bad configuration (templates, config file contents).
    Config { reason: String },
    /// Filesystem or pipe failure.
    Io {
        context: String,
        source: std::io::Error,
    },
    /// A cell failed; carries the pair being evaluated.
    Cell {
        pair: ParamPair,
        source: Box<SweepError>,
    },
}

impl SweepError {
    /// Stable short name of the error kind, for reports and exit messages.
    ///
    /// For [`SweepError::Cell`] this is the kind of the wrapped error.
    pub fn kind(&self) -> &'static str {
        match self {
            SweepError::Format { .. } => "format",
            SweepError::Misalignment { .. } => "misalignment",
            SweepError::EmptyInput => "empty-input",
            SweepError::BuildReport { .. } => "build-report",
            SweepError::Subprocess { .. } => "subprocess",
            SweepError::Timeout { .. } => "timeout",
            SweepError::InvalidGrid { .. } => "invalid-grid",
            SweepError::Config { .. } => "config",
            SweepError::Io { .. } => "io",
            SweepError::Cell { source, .. } => source.kind(),
        }
    }

    /// The failing pair, if this error was raised inside a grid cell.
    pub fn pair(&self) -> Option<ParamPair> {
        match self {
            SweepError::Cell { pair, .. } => Some(*pair),
            _ => None,
        }
    }

    /// Wrap with the pair being evaluated. Already-wrapped errors are kept as is.
    pub fn in_cell(self, pair: ParamPair) -> SweepError {
        match self {
            SweepError::Cell { .. } => self,
            other => SweepError::Cell {
                pair,
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> SweepError {
        SweepError::Io {
            context: context.into(),
            source,
        }
    }
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Format { path, line, reason } => {
                write!(f, "{}:{}: malformed mapping line: {}", path.display(), line, reason)
            }
            SweepError::Misalignment { truth, candidate } => {
                write!(
                    f,
                    "ground truth has {} queries but candidate has {}",
                    truth, candidate
                )
            }
            SweepError::EmptyInput => write!(f, "no queries to compare"),
            SweepError::BuildReport { counter, reason } => {
                write!(f, "build report counter '{}': {}", counter, reason)
            }
            SweepError::Subprocess {
                stage,
                command,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "{} stage `{}` exited with status {}", stage, command, code)?,
                    None => write!(f, "{} stage `{}` failed", stage, command)?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            SweepError::Timeout {
                stage,
                command,
                limit,
            } => {
                write!(
                    f,
                    "{} stage `{}` timed out after {:.1}s",
                    stage,
                    command,
                    limit.as_secs_f64()
                )
            }
            SweepError::InvalidGrid { reason } => write!(f, "invalid grid: {}", reason),
            SweepError::Config { reason } => write!(f, "invalid configuration: {}", reason),
            SweepError::Io { context, source } => write!(f, "{}: {}", context, source),
            SweepError::Cell { pair, source } => {
                write!(f, "cell {} failed ({}): {}", pair, source.kind(), source)
            }
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Io { source, .. } => Some(source),
            SweepError::Cell { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

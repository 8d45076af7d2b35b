// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sweep configuration.
//!
//! One [`SweepConfig`] is built up front (from CLI arguments and an optional
//! JSON file) and handed to [`crate::sweep::Sweep::new`]. Nothing in the
//! harness reads paths or labels from globals.
//!
//! # Config file
//!
//! ```json
//! {
//!   "grid": { "w_min": 4, "w_max": 11, "k_min": 3, "k_max": 10 },
//!   "engine": {
//!     "build": ["buildsa", "{reference}", "{k}", "{w}", "{index}"],
//!     "query": ["querysa", "{index}", "{queries}", "{output}", "2", "0"],
//!     "timeout_secs": 600
//!   },
//!   "parallelism": 1
//! }
//! ```

use crate::error::{Result, SweepError};
use crate::grid::{GridBounds, ParamPair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholders recognised in engine command templates.
pub const PLACEHOLDERS: &[&str] = &["reference", "k", "w", "index", "queries", "output"];

/// How to invoke the external index engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Build command template; must write the artifact to `{index}`.
    pub build: Vec<String>,
    /// Query command template; must write the mapping to `{output}`.
    pub query: Vec<String>,
    /// Per-invocation wall-clock limit. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            build: ["buildsa", "{reference}", "{k}", "{w}", "{index}"]
                .map(String::from)
                .to_vec(),
            query: ["querysa", "{index}", "{queries}", "{output}"]
                .map(String::from)
                .to_vec(),
            timeout_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        check_template("build", &self.build, &["reference", "k", "w", "index"])?;
        check_template("query", &self.query, &["index", "queries", "output"])?;
        if self.timeout_secs == Some(0) {
            return Err(SweepError::Config {
                reason: "timeout_secs must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn check_template(name: &str, template: &[String], required: &[&str]) -> Result<()> {
    if template.first().map_or(true, |program| program.trim().is_empty()) {
        return Err(SweepError::Config {
            reason: format!("{} command is empty", name),
        });
    }
    for arg in template {
        if let Some(unknown) = unknown_placeholder(arg) {
            return Err(SweepError::Config {
                reason: format!("{} command uses unknown placeholder {{{}}}", name, unknown),
            });
        }
    }
    for placeholder in required {
        let token = format!("{{{}}}", placeholder);
        if !template.iter().any(|arg| arg.contains(&token)) {
            return Err(SweepError::Config {
                reason: format!("{} command never uses {}", name, token),
            });
        }
    }
    Ok(())
}

/// First `{name}` in `arg` whose name is not one of [`PLACEHOLDERS`].
/// Braces around anything other than a lowercase identifier are literal.
fn unknown_placeholder(arg: &str) -> Option<&str> {
    let mut rest = arg;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[..close];
        let is_ident = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_lowercase() || c == '_');
        if is_ident && !PLACEHOLDERS.contains(&name) {
            return Some(name);
        }
        rest = &after[close + 1..];
    }
    None
}

/// Everything a sweep needs to run.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub reference: PathBuf,
    pub queries: PathBuf,
    pub ground_truth: PathBuf,
    pub output_dir: PathBuf,
    pub grid: GridBounds,
    pub engine: EngineConfig,
    /// Number of cells evaluated concurrently. 1 is strictly sequential.
    pub parallelism: usize,
}

impl SweepConfig {
    pub fn new(
        reference: impl Into<PathBuf>,
        queries: impl Into<PathBuf>,
        ground_truth: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        SweepConfig {
            reference: reference.into(),
            queries: queries.into(),
            ground_truth: ground_truth.into(),
            output_dir: output_dir.into(),
            grid: GridBounds::default(),
            engine: EngineConfig::default(),
            parallelism: 1,
        }
    }

    pub fn with_grid(mut self, grid: GridBounds) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Overlay the sections present in a config file.
    pub fn apply_file(mut self, file: SweepFile) -> Self {
        if let Some(grid) = file.grid {
            self.grid = grid;
        }
        if let Some(engine) = file.engine {
            self.engine = engine;
        }
        if let Some(parallelism) = file.parallelism {
            self.parallelism = parallelism;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.engine.validate()?;
        if self.parallelism == 0 {
            return Err(SweepError::Config {
                reason: "parallelism must be at least 1".to_string(),
            });
        }
        for (label, path) in [
            ("reference", &self.reference),
            ("queries", &self.queries),
            ("ground truth", &self.ground_truth),
        ] {
            if !path.is_file() {
                return Err(SweepError::Config {
                    reason: format!("{} file {} does not exist", label, path.display()),
                });
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }
}

/// Optional JSON overlay for [`SweepConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepFile {
    pub grid: Option<GridBounds>,
    pub engine: Option<EngineConfig>,
    pub parallelism: Option<usize>,
}

pub fn load_sweep_file(path: &Path) -> Result<SweepFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| SweepError::io(format!("Failed to read config {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| SweepError::Config {
        reason: format!("{}: {}", path.display(), e),
    })
}

/// Where a sweep puts its files.
///
/// ```text
/// <output_dir>/
///   index/build_k{k}_w{w}.bin     index artifacts
///   index/query_k{k}_w{w}.map     candidate mappings
///   results/results.csv           composite table
///   results/<metric>.csv          one matrix per metric
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        OutputLayout {
            root: root.to_path_buf(),
            index_dir: root.join("index"),
            results_dir: root.join("results"),
        }
    }

    /// Create the directory tree. Safe to call repeatedly.
    pub fn create(&self) -> Result<()> {
        for dir in [&self.index_dir, &self.results_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                SweepError::io(format!("Failed to create {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    pub fn index_artifact(&self, pair: ParamPair) -> PathBuf {
        self.index_dir
            .join(format!("build_k{}_w{}.bin", pair.k(), pair.w()))
    }

    pub fn candidate_mapping(&self, pair: ParamPair) -> PathBuf {
        self.index_dir
            .join(format!("query_k{}_w{}.map", pair.k(), pair.w()))
    }

    pub fn results_file(&self, name: &str) -> PathBuf {
        self.results_dir.join(name)
    }
}

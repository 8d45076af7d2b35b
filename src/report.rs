// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Result tables: the composite table and one scalar matrix per metric.
//!
//! Every table shares the same shape, rows are `w` and columns are `k`:
//!
//! ```text
//! w\k,3,4,5
//! 4,0.412,,
//! 5,0.371,0.402,
//! 6,0.335,0.366,0.398
//! ```
//!
//! Cells outside the grid (`k >= w`) or never evaluated are written as empty
//! strings. They are never `0`, which would read as "evaluated, zero".
//!
//! Matrices are projected straight from typed [`CellResult`]s. The composite
//! table's human-readable text is output only and is never parsed back.

use crate::config::OutputLayout;
use crate::error::{Result, SweepError};
use crate::grid::GridBounds;
use crate::sweep::CellResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Header of the first column of every table.
pub const CORNER: &str = "w\\k";

/// Composite table file name.
pub const RESULTS_CSV: &str = "results.csv";
/// Typed results dump, input of the `matrix` command.
pub const RESULTS_JSON: &str = "results.json";
/// Composite table written when a sweep aborts.
pub const PARTIAL_CSV: &str = "partial_results.csv";
/// Typed dump written when a sweep aborts.
pub const PARTIAL_JSON: &str = "partial_results.json";

/// A scalar projected out of every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Reduction,
    BuildTime,
    QueryTime,
    FileSize,
    FalseNegatives,
    FalsePositives,
    FalsePositiveRate,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Reduction,
        Metric::BuildTime,
        Metric::QueryTime,
        Metric::FileSize,
        Metric::FalseNegatives,
        Metric::FalsePositives,
        Metric::FalsePositiveRate,
    ];

    /// Short label used in the composite cell text.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Reduction => "R",
            Metric::BuildTime => "BT",
            Metric::QueryTime => "QT",
            Metric::FileSize => "FS",
            Metric::FalseNegatives => "FN",
            Metric::FalsePositives => "FP",
            Metric::FalsePositiveRate => "FPR",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Reduction => "reduction",
            Metric::BuildTime => "build_time",
            Metric::QueryTime => "query_time",
            Metric::FileSize => "file_size",
            Metric::FalseNegatives => "false_negatives",
            Metric::FalsePositives => "false_positives",
            Metric::FalsePositiveRate => "false_positive_rate",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Unit suffix in the composite text.
    fn unit(self) -> &'static str {
        match self {
            Metric::BuildTime | Metric::QueryTime => "s",
            Metric::FileSize => "KB",
            _ => "",
        }
    }

    /// Project this metric out of a cell. File size is in KiB.
    pub fn value(self, cell: &CellResult) -> f64 {
        match self {
            Metric::Reduction => cell.reduction,
            Metric::BuildTime => cell.build_secs,
            Metric::QueryTime => cell.query_secs,
            Metric::FileSize => (cell.index_bytes / 1024) as f64,
            Metric::FalseNegatives => cell.accuracy.avg_false_negatives,
            Metric::FalsePositives => cell.accuracy.avg_false_positives,
            Metric::FalsePositiveRate => cell.accuracy.false_positive_rate,
        }
    }

    /// Render a value with this metric's precision.
    pub fn format(self, value: f64) -> String {
        match self {
            Metric::BuildTime | Metric::QueryTime => format!("{:.2}", value),
            Metric::FileSize => format!("{}", value as u64),
            _ => format!("{:.3}", value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    /// Accepts the file name stem (`false_positive_rate`) or the label (`FPR`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().trim_end_matches(".csv").replace('-', "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == needle || m.label().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| {
                let known: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
                format!("unknown metric '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// `R=0.333, BT=0.12s, QT=0.05s, FS=12KB, FN=0.000, FP=1.250, FPR=0.500`
pub fn composite_text(cell: &CellResult) -> String {
    Metric::ALL
        .iter()
        .map(|m| format!("{}={}{}", m.label(), m.format(m.value(cell)), m.unit()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One metric over the grid. Absent cells are simply not in `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatrix {
    pub name: String,
    pub w_values: Vec<usize>,
    pub k_values: Vec<usize>,
    pub values: BTreeMap<(usize, usize), f64>,
}

impl MetricMatrix {
    /// Project `metric` out of `cells`. Cells outside `grid` are ignored.
    pub fn from_cells(metric: Metric, grid: &GridBounds, cells: &[CellResult]) -> Self {
        let values = cells
            .iter()
            .filter(|c| grid.contains(c.pair.w(), c.pair.k()))
            .map(|c| ((c.pair.w(), c.pair.k()), metric.value(c)))
            .collect();
        MetricMatrix {
            name: metric.name().to_string(),
            w_values: grid.w_values(),
            k_values: grid.k_values(),
            values,
        }
    }

    pub fn get(&self, w: usize, k: usize) -> Option<f64> {
        self.values.get(&(w, k)).copied()
    }

    /// The values of row `w` across all `k` columns.
    pub fn row(&self, w: usize) -> Vec<(usize, Option<f64>)> {
        self.k_values.iter().map(|&k| (k, self.get(w, k))).collect()
    }

    /// Header plus one row per `w`, with `format` applied to present cells.
    pub fn to_rows(&self, format: impl Fn(f64) -> String) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(self.w_values.len() + 1);
        rows.push(header(&self.k_values));
        for &w in &self.w_values {
            let mut row = vec![w.to_string()];
            row.extend(
                self.k_values
                    .iter()
                    .map(|&k| self.get(w, k).map(&format).unwrap_or_default()),
            );
            rows.push(row);
        }
        rows
    }

    /// Read a matrix table back. Empty cells stay absent.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let table = read_table(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bad = |reason: String| SweepError::Format {
            path: path.to_path_buf(),
            line: 1,
            reason,
        };

        let (head, body) = table
            .split_first()
            .ok_or_else(|| bad("empty table".to_string()))?;
        if head.first().map(String::as_str) != Some(CORNER) {
            return Err(bad(format!("first header cell must be '{}'", CORNER)));
        }
        let k_values = head[1..]
            .iter()
            .map(|k| k.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| bad(format!("bad k header: {}", e)))?;

        let mut w_values = Vec::with_capacity(body.len());
        let mut values = BTreeMap::new();
        for (i, row) in body.iter().enumerate() {
            let line = i + 2;
            let row_err = |reason: String| SweepError::Format {
                path: path.to_path_buf(),
                line,
                reason,
            };
            let (w, cells) = row
                .split_first()
                .ok_or_else(|| row_err("empty row".to_string()))?;
            let w = w
                .trim()
                .parse::<usize>()
                .map_err(|e| row_err(format!("bad w label: {}", e)))?;
            w_values.push(w);
            for (&k, cell) in k_values.iter().zip(cells) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value = cell
                    .parse::<f64>()
                    .map_err(|e| row_err(format!("bad value '{}' at k={}: {}", cell, k, e)))?;
                values.insert((w, k), value);
            }
        }

        Ok(MetricMatrix {
            name,
            w_values,
            k_values,
            values,
        })
    }
}

fn header(k_values: &[usize]) -> Vec<String> {
    std::iter::once(CORNER.to_string())
        .chain(k_values.iter().map(|k| k.to_string()))
        .collect()
}

/// The composite table: one formatted record per evaluated cell.
pub fn composite_rows(grid: &GridBounds, cells: &[CellResult]) -> Vec<Vec<String>> {
    let by_pair: BTreeMap<(usize, usize), &CellResult> = cells
        .iter()
        .map(|c| ((c.pair.w(), c.pair.k()), c))
        .collect();
    let k_values = grid.k_values();

    let mut rows = vec![header(&k_values)];
    for w in grid.w_values() {
        let mut row = vec![w.to_string()];
        row.extend(k_values.iter().map(|&k| {
            by_pair
                .get(&(w, k))
                .map(|c| composite_text(c))
                .unwrap_or_default()
        }));
        rows.push(row);
    }
    rows
}

/// Write rows as a CSV file.
pub fn write_table(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let to_err = |e: csv::Error| SweepError::io(format!("Failed to write {}", path.display()), e.into());
    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_path(path)
        .map_err(to_err)?;
    for row in rows {
        writer.write_record(row).map_err(to_err)?;
    }
    writer
        .flush()
        .map_err(|e| SweepError::io(format!("Failed to write {}", path.display()), e))
}

fn read_table(path: &Path) -> Result<Vec<Vec<String>>> {
    let to_err = |e: csv::Error| SweepError::io(format!("Failed to read {}", path.display()), e.into());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(to_err)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(to_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Everything needed to re-derive every table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub grid: GridBounds,
    pub cells: Vec<CellResult>,
}

pub fn save_results(path: &Path, results: &ResultsFile) -> Result<()> {
    let json = serde_json::to_string_pretty(results).map_err(|e| SweepError::Config {
        reason: format!("Failed to serialize results: {}", e),
    })?;
    fs::write(path, json).map_err(|e| SweepError::io(format!("Failed to write {}", path.display()), e))
}

pub fn load_results(path: &Path) -> Result<ResultsFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| SweepError::io(format!("Failed to read {}", path.display()), e))?;
    let results: ResultsFile = serde_json::from_str(&content).map_err(|e| SweepError::Config {
        reason: format!("{}: {}", path.display(), e),
    })?;
    results.grid.validate()?;
    Ok(results)
}

/// Write one matrix per metric into `dir`. Returns the written paths.
pub fn write_matrices(dir: &Path, grid: &GridBounds, cells: &[CellResult]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let matrix = MetricMatrix::from_cells(metric, grid, cells);
        let path = dir.join(metric.file_name());
        write_table(&path, &matrix.to_rows(|v| metric.format(v)))?;
        written.push(path);
    }
    Ok(written)
}

/// Write the full report set of a finished sweep.
pub fn write_reports(layout: &OutputLayout, grid: &GridBounds, cells: &[CellResult]) -> Result<Vec<PathBuf>> {
    let composite = layout.results_file(RESULTS_CSV);
    write_table(&composite, &composite_rows(grid, cells))?;

    let json = layout.results_file(RESULTS_JSON);
    save_results(
        &json,
        &ResultsFile {
            grid: *grid,
            cells: cells.to_vec(),
        },
    )?;

    let mut written = vec![composite, json];
    written.extend(write_matrices(&layout.results_dir, grid, cells)?);
    Ok(written)
}

/// Every table a sweep may write under `results/`.
pub fn report_files(layout: &OutputLayout) -> Vec<PathBuf> {
    [RESULTS_CSV, RESULTS_JSON, PARTIAL_CSV, PARTIAL_JSON]
        .into_iter()
        .map(|name| layout.results_file(name))
        .chain(Metric::ALL.iter().map(|m| layout.results_file(&m.file_name())))
        .collect()
}

/// Remove the tables of an earlier run so a new run's outcome is the only
/// one left in `results/`. Returns the removed paths.
pub fn clear_reports(layout: &OutputLayout) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in report_files(layout) {
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SweepError::io(
                    format!("Failed to remove stale {}", path.display()),
                    e,
                ))
            }
        }
    }
    Ok(removed)
}

/// Flush the cells completed before a failure.
pub fn write_partial(layout: &OutputLayout, grid: &GridBounds, cells: &[CellResult]) -> Result<Vec<PathBuf>> {
    let composite = layout.results_file(PARTIAL_CSV);
    write_table(&composite, &composite_rows(grid, cells))?;
    let json = layout.results_file(PARTIAL_JSON);
    save_results(
        &json,
        &ResultsFile {
            grid: *grid,
            cells: cells.to_vec(),
        },
    )?;
    Ok(vec![composite, json])
}

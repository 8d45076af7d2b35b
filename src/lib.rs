//! Parameter sweeps and correctness scoring for minimizer sequence indexes.
//!
//! A minimizer index trades accuracy for size through two knobs: the
//! substring length `k` and the window size `w` (`k < w`). This crate drives
//! an external index engine over a `(w, k)` grid, scores every configuration
//! against an exhaustive ground-truth mapping, and writes one matrix per
//! metric for plotting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────────┐     ┌─────────────┐
//! │ grid.rs  │────▶│   sweep.rs   │────▶│  report.rs  │──▶ results/*.csv
//! │ (w,k)    │     │ (driver)     │     │ (matrices)  │
//! └──────────┘     └──────────────┘     └─────────────┘
//!                    │          │
//!                    ▼          ▼
//!           ┌────────────┐  ┌──────────────┐
//!           │ engine.rs  │  │ mapping.rs + │
//!           │ build/query│  │ compare.rs   │
//!           │ subprocess │  │ (FN / FP)    │
//!           └────────────┘  └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mzsweep::{GridBounds, Sweep, SweepConfig};
//!
//! let config = SweepConfig::new("ref.fa", "reads.fq", "truth.map", "data")
//!     .with_grid(GridBounds::for_windows(4, 11)?);
//! let outcome = Sweep::with_process_engine(config).run()?;
//! println!("{} cells", outcome.cells.len());
//! ```

// Module declarations
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod logging;
pub mod mapping;
pub mod report;
pub mod sweep;
pub mod testing;

// Re-exports for public API
pub use compare::{compare, per_query, Accuracy, QueryOutcome};
pub use config::{load_sweep_file, EngineConfig, OutputLayout, SweepConfig, SweepFile};
pub use engine::{render_template, BuildReport, IndexEngine, ProcessEngine};
pub use error::{Result, Stage, SweepError};
pub use grid::{GridBounds, ParamPair, MIN_K};
pub use mapping::{
    parse_line, parse_mapping, parse_mapping_reader, parse_mapping_str, HitSet, MappingFormat,
    CANDIDATE, GROUND_TRUTH,
};
pub use report::{
    composite_text, load_results, write_matrices, write_reports, Metric, MetricMatrix,
    ResultsFile,
};
pub use sweep::{CellResult, Sweep, SweepOutcome};

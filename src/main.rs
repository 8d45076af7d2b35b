use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use mzsweep::logging::init_logger;
use mzsweep::report::{write_matrices, RESULTS_JSON};
use mzsweep::{
    compare, load_results, load_sweep_file, parse_mapping, GridBounds, Metric, MetricMatrix,
    Sweep, SweepConfig, SweepError, CANDIDATE, GROUND_TRUTH, MIN_K,
};

mod cli;
use cli::{display, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Sweep {
            reference,
            queries,
            ground_truth,
            output,
            config,
            w_min,
            w_max,
            timeout,
            jobs,
        } => run_sweep(SweepArgs {
            reference,
            queries,
            ground_truth,
            output,
            config,
            w_min,
            w_max,
            timeout,
            jobs,
        }),
        Commands::Evaluate {
            ground_truth,
            candidate,
            json,
        } => run_evaluate(&ground_truth, &candidate, json),
        Commands::Matrix {
            results,
            output,
            show,
        } => run_matrix(&results, output.as_deref(), show.as_deref()),
        Commands::Strategies {
            metric,
            w,
            first,
            second,
        } => run_strategies(&metric, w, &first, &second),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

struct SweepArgs {
    reference: PathBuf,
    queries: PathBuf,
    ground_truth: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    w_min: Option<usize>,
    w_max: Option<usize>,
    timeout: Option<u64>,
    jobs: Option<usize>,
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    let mut config = SweepConfig::new(args.reference, args.queries, args.ground_truth, args.output);
    if let Some(path) = &args.config {
        let file = load_sweep_file(path)?;
        config = config.apply_file(file);
    }

    if args.w_min.is_some() || args.w_max.is_some() {
        let grid = GridBounds {
            w_min: args.w_min.unwrap_or(config.grid.w_min),
            w_max: args.w_max.unwrap_or(config.grid.w_max),
            ..config.grid
        };
        // Widen the columns when the windows grow past the configured k range.
        let k_max = grid.k_max.max(grid.w_max.saturating_sub(1)).max(MIN_K);
        config.grid = GridBounds { k_max, ..grid };
    }
    if let Some(secs) = args.timeout {
        config.engine.timeout_secs = Some(secs);
    }
    if let Some(jobs) = args.jobs {
        config.parallelism = jobs;
    }

    let sweep = Sweep::with_process_engine(config).with_progress(true);
    match sweep.run() {
        Ok(outcome) => {
            display::print_summary(&outcome);
            Ok(())
        }
        Err(err) => Err(describe_failure(err)),
    }
}

fn describe_failure(err: SweepError) -> anyhow::Error {
    match err.pair() {
        Some(pair) => anyhow::anyhow!(
            "sweep aborted at {} [{}]: {}",
            pair,
            err.kind(),
            err
        ),
        None => anyhow::Error::new(err).context("sweep failed"),
    }
}

fn run_evaluate(ground_truth: &Path, candidate: &Path, json: bool) -> Result<()> {
    let truth = parse_mapping(ground_truth, GROUND_TRUTH)?;
    let cand = parse_mapping(candidate, CANDIDATE)?;
    let accuracy = compare(&truth, &cand)
        .with_context(|| format!("comparing {} with {}", ground_truth.display(), candidate.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accuracy)?);
    } else {
        display::print_accuracy(&accuracy);
    }
    Ok(())
}

fn run_matrix(results: &Path, output: Option<&Path>, show: Option<&str>) -> Result<()> {
    let loaded = load_results(results)?;
    let dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => results
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;

    let written = write_matrices(&dir, &loaded.grid, &loaded.cells)?;
    for path in &written {
        eprintln!("  ✓ {}", path.display());
    }

    if let Some(name) = show {
        let metric: Metric = name.parse().map_err(anyhow::Error::msg)?;
        let matrix = MetricMatrix::from_cells(metric, &loaded.grid, &loaded.cells);
        display::print_matrix(&matrix, Some(metric));
    }
    Ok(())
}

fn run_strategies(metric: &str, w: usize, first: &Path, second: &Path) -> Result<()> {
    let metric: Metric = metric.parse().map_err(anyhow::Error::msg)?;

    let load = |dir: &Path| -> Result<MetricMatrix> {
        let path = dir.join(metric.file_name());
        if !path.is_file() {
            bail!(
                "{} not found (expected a sweep results directory, or run `mzsweep matrix {}` first)",
                path.display(),
                dir.join(RESULTS_JSON).display()
            );
        }
        Ok(MetricMatrix::read_csv(&path)?)
    };
    let a = load(first)?;
    let b = load(second)?;

    if !a.w_values.contains(&w) && !b.w_values.contains(&w) {
        bail!("w={} is not a row of either matrix", w);
    }

    let mut ks: Vec<usize> = a.k_values.iter().chain(&b.k_values).copied().collect();
    ks.sort_unstable();
    ks.dedup();
    let points: Vec<(usize, Option<f64>, Option<f64>)> =
        ks.into_iter().map(|k| (k, a.get(w, k), b.get(w, k))).collect();

    let names = (strategy_name(first), strategy_name(second));
    display::print_series(metric, w, (names.0.as_str(), names.1.as_str()), &points);
    Ok(())
}

/// Label a results directory by its last meaningful path component.
fn strategy_name(dir: &Path) -> String {
    dir.components()
        .rev()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .find(|c| c != "results" && c != "." && !c.is_empty())
        .unwrap_or_else(|| dir.display().to_string())
}

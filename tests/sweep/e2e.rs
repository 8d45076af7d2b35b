//! End-to-end sweeps through real subprocesses.

use crate::common::{Fixture, FAKE_INDEX_BYTES};
use mzsweep::{GridBounds, Sweep};
use tempfile::TempDir;

#[test]
fn test_sweep_small_grid() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    let config = fixture
        .config()
        .with_grid(GridBounds::for_windows(4, 6).unwrap());

    let outcome = Sweep::with_process_engine(config).run().unwrap();

    let pairs: Vec<(usize, usize)> = outcome
        .cells
        .iter()
        .map(|c| (c.pair.w(), c.pair.k()))
        .collect();
    assert_eq!(pairs, vec![(4, 3), (5, 3), (5, 4), (6, 3), (6, 4), (6, 5)]);
    assert_eq!(outcome.cells.len(), (4..=6).map(|w| w - 3).sum::<usize>());
}

#[test]
fn test_sweep_cell_metrics() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    let config = fixture
        .config()
        .with_grid(GridBounds::for_windows(4, 6).unwrap());

    let outcome = Sweep::with_process_engine(config).run().unwrap();

    for cell in &outcome.cells {
        let (w, k) = (cell.pair.w(), cell.pair.k());
        assert_eq!(cell.original_len, 1200);
        assert_eq!(cell.minimizer_len, 1200 / (w - k + 1) as u64);
        assert!((cell.reduction - 1.0 / (w - k + 1) as f64).abs() < 1e-9);
        assert_eq!(cell.index_bytes, FAKE_INDEX_BYTES);
        assert!(cell.build_secs >= 0.0 && cell.query_secs >= 0.0);

        let acc = cell.accuracy;
        assert_eq!(acc.queries, 2);
        assert_eq!(acc.avg_false_negatives, 0.0, "at {}", cell.pair);
        if w - k > 2 {
            assert_eq!(acc.avg_false_positives, 0.5, "at {}", cell.pair);
            assert_eq!(acc.false_positive_rate, 0.5, "at {}", cell.pair);
        } else {
            assert_eq!(acc.avg_false_positives, 0.0, "at {}", cell.pair);
            assert_eq!(acc.false_positive_rate, 0.0, "at {}", cell.pair);
        }
    }
}

#[test]
fn test_sweep_keeps_artifacts_per_pair() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    let config = fixture
        .config()
        .with_grid(GridBounds::for_windows(4, 5).unwrap());

    let sweep = Sweep::with_process_engine(config);
    sweep.run().unwrap();

    let layout = sweep.layout();
    for pair in GridBounds::for_windows(4, 5).unwrap().pairs() {
        assert!(layout.index_artifact(pair).is_file(), "{}", pair);
        assert!(layout.candidate_mapping(pair).is_file(), "{}", pair);
    }
}

#[test]
fn test_sweep_rerun_into_same_output() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    let grid = GridBounds::for_windows(4, 5).unwrap();

    let first = Sweep::with_process_engine(fixture.config().with_grid(grid))
        .run()
        .unwrap();
    let second = Sweep::with_process_engine(fixture.config().with_grid(grid))
        .run()
        .unwrap();

    assert_eq!(first.cells.len(), second.cells.len());
    for (a, b) in first.cells.iter().zip(&second.cells) {
        assert_eq!(a.pair, b.pair);
        assert_eq!(a.accuracy, b.accuracy);
    }
}

#[test]
fn test_extra_engine_arguments_are_passed_through() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    // Query stage demands two trailing tuning arguments, like the real binary.
    fixture.override_script(
        "query.sh",
        r#"#!/bin/sh
[ "$4" = "2" ] && [ "$5" = "0" ] || { echo "missing check counts" >&2; exit 9; }
printf 'q1\t2\trefA\trefB\nq2\t1\trefC\n' > "$3"
"#,
    );
    let mut engine = fixture.engine();
    engine.query.extend(["2".to_string(), "0".to_string()]);
    let config = fixture
        .config()
        .with_engine(engine)
        .with_grid(GridBounds::for_windows(4, 4).unwrap());

    let outcome = Sweep::with_process_engine(config).run().unwrap();
    assert_eq!(outcome.cells.len(), 1);
    assert_eq!(outcome.cells[0].accuracy.avg_false_positives, 0.0);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_sweep_orders_cells() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    let grid = GridBounds::for_windows(4, 7).unwrap();
    let config = fixture.config().with_grid(grid).with_parallelism(3);

    let outcome = Sweep::with_process_engine(config).run().unwrap();

    let pairs: Vec<_> = outcome.cells.iter().map(|c| c.pair).collect();
    assert_eq!(pairs, grid.pairs());
}

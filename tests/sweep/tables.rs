//! Shape and content of the written tables.

use crate::common::Fixture;
use mzsweep::report::{write_matrices, RESULTS_CSV, RESULTS_JSON};
use mzsweep::{load_results, GridBounds, Metric, MetricMatrix, Sweep};
use std::fs;
use tempfile::TempDir;

fn run_small(temp: &TempDir) -> (Fixture, mzsweep::SweepOutcome) {
    let fixture = Fixture::new(temp.path());
    let config = fixture
        .config()
        .with_grid(GridBounds::for_windows(4, 6).unwrap());
    let outcome = Sweep::with_process_engine(config).run().unwrap();
    (fixture, outcome)
}

#[test]
fn test_composite_table_layout() {
    let temp = TempDir::new().unwrap();
    let (fixture, _) = run_small(&temp);

    let csv = fs::read_to_string(fixture.output.join("results").join(RESULTS_CSV)).unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv.as_bytes());
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();

    assert_eq!(rows[0], vec!["w\\k", "3", "4", "5"]);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1][0], "4");
    assert!(rows[1][1].starts_with("R=0.500, BT="), "{}", rows[1][1]);
    assert!(rows[1][1].contains("FS=2KB"), "{}", rows[1][1]);
    assert!(rows[1][1].ends_with("FN=0.000, FP=0.000, FPR=0.000"), "{}", rows[1][1]);
    // k >= w stays blank
    assert_eq!(rows[1][2], "");
    assert_eq!(rows[1][3], "");
    // (w=6, k=3) picks up the spurious hit
    assert!(rows[3][1].ends_with("FN=0.000, FP=0.500, FPR=0.500"), "{}", rows[3][1]);
}

#[test]
fn test_metric_files_written() {
    let temp = TempDir::new().unwrap();
    let (fixture, outcome) = run_small(&temp);
    let results = fixture.output.join("results");

    for metric in Metric::ALL {
        let path = results.join(metric.file_name());
        assert!(outcome.written.contains(&path), "{}", path.display());
        assert!(path.is_file(), "{}", path.display());
    }
    assert!(results.join(RESULTS_JSON).is_file());
}

#[test]
fn test_matrix_zero_is_not_blank() {
    let temp = TempDir::new().unwrap();
    let (fixture, _) = run_small(&temp);

    let text =
        fs::read_to_string(fixture.output.join("results").join("false_positives.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec!["w\\k,3,4,5", "4,0.000,,", "5,0.000,0.000,", "6,0.500,0.000,0.000"]
    );
}

#[test]
fn test_matrix_reads_back() {
    let temp = TempDir::new().unwrap();
    let (fixture, _) = run_small(&temp);

    let matrix =
        MetricMatrix::read_csv(&fixture.output.join("results").join("reduction.csv")).unwrap();
    assert_eq!(matrix.w_values, vec![4, 5, 6]);
    assert_eq!(matrix.k_values, vec![3, 4, 5]);
    assert_eq!(matrix.get(4, 3), Some(0.5));
    assert_eq!(matrix.get(6, 3), Some(0.25));
    assert_eq!(matrix.get(6, 4), Some(0.333));
    assert_eq!(matrix.get(5, 5), None);
    assert_eq!(matrix.values.len(), 6);
}

#[test]
fn test_matrices_regenerate_from_results_json() {
    let temp = TempDir::new().unwrap();
    let (fixture, outcome) = run_small(&temp);
    let results = fixture.output.join("results");

    let loaded = load_results(&results.join(RESULTS_JSON)).unwrap();
    assert_eq!(loaded.grid, outcome.grid);
    assert_eq!(loaded.cells.len(), outcome.cells.len());
    for (a, b) in loaded.cells.iter().zip(&outcome.cells) {
        assert_eq!(a.pair, b.pair);
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.index_bytes, b.index_bytes);
    }

    let regen = temp.path().join("regen");
    fs::create_dir_all(&regen).unwrap();
    write_matrices(&regen, &loaded.grid, &loaded.cells).unwrap();

    for metric in Metric::ALL {
        let original = fs::read_to_string(results.join(metric.file_name())).unwrap();
        let again = fs::read_to_string(regen.join(metric.file_name())).unwrap();
        assert_eq!(original, again, "{}", metric);
    }
}

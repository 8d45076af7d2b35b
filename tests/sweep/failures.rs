//! Failure policy: first bad cell aborts, names the pair, flushes finished work.

use crate::common::Fixture;
use mzsweep::report::{load_results, PARTIAL_CSV, PARTIAL_JSON, RESULTS_CSV};
use mzsweep::{GridBounds, ParamPair, Sweep, SweepError};
use std::fs;
use tempfile::TempDir;

fn grid_4_to_6() -> GridBounds {
    GridBounds::for_windows(4, 6).unwrap()
}

#[test]
fn test_malformed_build_report_aborts_at_pair() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    // Drop the minimizer counter for (w=5, k=4) only.
    fixture.override_script(
        "build.sh",
        r#"#!/bin/sh
printf '%s %s\n' "$2" "$3" > "$4"
echo "Original sequence length: 1200"
if [ "$3" = "5" ] && [ "$2" = "4" ]; then exit 0; fi
echo "Minimizer sequence length (indices stored): 300"
"#,
    );
    let sweep = Sweep::with_process_engine(fixture.config().with_grid(grid_4_to_6()));

    let err = sweep.run().unwrap_err();
    assert_eq!(err.kind(), "build-report");
    assert_eq!(err.pair(), Some(ParamPair::new(5, 4).unwrap()));
    assert!(err.to_string().contains("(w=5, k=4)"), "{}", err);
}

#[test]
fn test_partial_results_flushed_on_failure() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    fixture.override_script(
        "query.sh",
        r#"#!/bin/sh
read k w < "$1"
if [ "$w" = "6" ]; then echo "out of memory" >&2; exit 137; fi
printf 'q1\t2\trefA\trefB\nq2\t1\trefC\n' > "$3"
"#,
    );
    let sweep = Sweep::with_process_engine(fixture.config().with_grid(grid_4_to_6()));

    let err = sweep.run().unwrap_err();
    assert_eq!(err.kind(), "subprocess");
    assert_eq!(err.pair(), Some(ParamPair::new(6, 3).unwrap()));
    assert!(err.to_string().contains("out of memory"), "{}", err);

    let layout = sweep.layout();
    assert!(!layout.results_file(RESULTS_CSV).exists());

    let partial = load_results(&layout.results_file(PARTIAL_JSON)).unwrap();
    let done: Vec<(usize, usize)> = partial
        .cells
        .iter()
        .map(|c| (c.pair.w(), c.pair.k()))
        .collect();
    assert_eq!(done, vec![(4, 3), (5, 3), (5, 4)]);

    let csv = fs::read_to_string(layout.results_file(PARTIAL_CSV)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "w\\k,3,4,5");
    assert!(lines[1].starts_with("4,\"R=0.500"), "{}", lines[1]);
    // w=6 row exists but holds no cells
    assert_eq!(lines[3], "6,,,");
}

#[test]
fn test_no_partial_file_when_first_cell_fails() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    fixture.override_script("build.sh", "#!/bin/sh\nexit 1\n");
    let sweep = Sweep::with_process_engine(fixture.config().with_grid(grid_4_to_6()));

    let err = sweep.run().unwrap_err();
    assert_eq!(err.kind(), "subprocess");
    assert_eq!(err.pair(), Some(ParamPair::new(4, 3).unwrap()));
    assert!(!sweep.layout().results_file(PARTIAL_JSON).exists());
}

#[test]
fn test_query_count_mismatch_is_misalignment() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    fixture.override_script(
        "query.sh",
        "#!/bin/sh\nprintf 'q1\\t2\\trefA\\trefB\\n' > \"$3\"\n",
    );
    let sweep = Sweep::with_process_engine(fixture.config().with_grid(grid_4_to_6()));

    match sweep.run().unwrap_err() {
        SweepError::Cell { pair, source } => {
            assert_eq!(pair, ParamPair::new(4, 3).unwrap());
            assert!(matches!(
                *source,
                SweepError::Misalignment {
                    truth: 2,
                    candidate: 1
                }
            ));
        }
        other => panic!("expected Cell error, got {:?}", other),
    }
}

#[test]
fn test_stage_timeout() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    // Not `exec`: the shell stays the parent and `sleep` holds the pipes.
    fixture.override_script("query.sh", "#!/bin/sh\nsleep 10\necho done\n");
    let mut engine = fixture.engine();
    engine.timeout_secs = Some(1);
    let config = fixture
        .config()
        .with_engine(engine)
        .with_grid(GridBounds::for_windows(4, 4).unwrap());

    let started = std::time::Instant::now();
    let err = Sweep::with_process_engine(config).run().unwrap_err();
    assert_eq!(err.kind(), "timeout");
    assert!(err.to_string().contains("query stage"), "{}", err);
    assert!(
        started.elapsed() < std::time::Duration::from_secs(5),
        "{:?}",
        started.elapsed()
    );
}

#[test]
fn test_missing_ground_truth_fails_before_any_cell() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    fs::remove_file(&fixture.ground_truth).unwrap();

    let err = Sweep::with_process_engine(fixture.config()).run().unwrap_err();
    assert_eq!(err.kind(), "config");
    assert_eq!(err.pair(), None);
}

#[test]
fn test_malformed_ground_truth_is_format_error() {
    let temp = TempDir::new().unwrap();
    let fixture = Fixture::new(temp.path());
    fs::write(&fixture.ground_truth, "q1\tchr\t100\t+\trefA\nq2\tchr\n").unwrap();

    let err = Sweep::with_process_engine(fixture.config()).run().unwrap_err();
    match err {
        SweepError::Format { line, .. } => assert_eq!(line, 2),
        other => panic!("expected Format, got {:?}", other),
    }
}

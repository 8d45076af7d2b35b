//! Grid enumeration and matrix shape.

use mzsweep::testing::make_cell;
use mzsweep::{GridBounds, Metric, MetricMatrix, ParamPair, MIN_K};
use proptest::prelude::*;

fn window_range() -> impl Strategy<Value = (usize, usize)> {
    (MIN_K + 1..16usize).prop_flat_map(|w_min| (Just(w_min), w_min..20usize))
}

proptest! {
    #[test]
    fn prop_pairs_satisfy_k_below_w((w_min, w_max) in window_range()) {
        let grid = GridBounds::for_windows(w_min, w_max).unwrap();
        let pairs = grid.pairs();
        for pair in &pairs {
            prop_assert!(pair.k() < pair.w());
            prop_assert!(pair.k() >= MIN_K);
            prop_assert!(grid.contains(pair.w(), pair.k()));
        }
        let expected: usize = (w_min..=w_max).map(|w| w - MIN_K).sum();
        prop_assert_eq!(pairs.len(), expected);
    }

    #[test]
    fn prop_pairs_are_strictly_ordered((w_min, w_max) in window_range()) {
        let pairs = GridBounds::for_windows(w_min, w_max).unwrap().pairs();
        for win in pairs.windows(2) {
            let (a, b) = (win[0], win[1]);
            prop_assert!((a.w(), a.k()) < (b.w(), b.k()));
        }
    }

    #[test]
    fn prop_pair_validation(w in 0usize..30, k in 0usize..30) {
        prop_assert_eq!(ParamPair::new(w, k).is_ok(), k >= MIN_K && k < w);
    }

    #[test]
    fn prop_matrix_populated_cells_equal_grid((w_min, w_max) in window_range()) {
        let grid = GridBounds::for_windows(w_min, w_max).unwrap();
        let cells: Vec<_> = grid.pairs().into_iter().map(|p| make_cell(p.w(), p.k())).collect();
        let matrix = MetricMatrix::from_cells(Metric::FalsePositiveRate, &grid, &cells);

        prop_assert_eq!(matrix.values.len(), cells.len());
        for row in matrix.to_rows(|v| Metric::FalsePositiveRate.format(v)).iter().skip(1) {
            let w: usize = row[0].parse().unwrap();
            for (k, cell) in grid.k_values().into_iter().zip(&row[1..]) {
                prop_assert_eq!(cell.is_empty(), k >= w);
            }
        }
    }
}

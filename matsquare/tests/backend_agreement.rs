use matsquare::{
    find_biggest_square, search_batch, BackendConfig, BoundaryBackend, DirectBackend,
    MatrixCapability, OwnedMatrix,
};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Side of the largest uniform square rooted at `(i, j)`, by brute force
fn rooted_square(rows: &[Vec<f64>], i: usize, j: usize) -> usize {
    let value = rows[i][j];
    let max_side = (rows.len() - i).min(rows[0].len() - j);
    (1..=max_side)
        .take_while(|&side| {
            (i..i + side).all(|r| (j..j + side).all(|c| rows[r][c] == value))
        })
        .last()
        .unwrap_or(0)
}

/// Reference answer: first maximal square in reverse row-major order
fn reference(rows: &[Vec<f64>]) -> (i64, i64, i64) {
    let mut best = (-1, -1, 0);
    for i in (0..rows.len()).rev() {
        for j in (0..rows[0].len()).rev() {
            let side = rooted_square(rows, i, j) as i64;
            if side > best.2 {
                best = (i as i64, j as i64, side);
            }
        }
    }
    best
}

fn run<C: MatrixCapability>(capability: &C, rows: &[Vec<f64>]) -> (i64, i64, i64)
where
    C::Error: std::fmt::Debug,
{
    let matrix = OwnedMatrix::from_rows(capability, rows).unwrap();
    let result = find_biggest_square(capability, matrix.handle()).unwrap();
    (result.row(), result.column(), result.size())
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|value| value.to_bits()).collect()
}

/// Write `values` down a column, then read them back
fn read_back<C: MatrixCapability>(capability: &C, values: &[f64]) -> Vec<u64>
where
    C::Error: std::fmt::Debug,
{
    let handle = capability.create(values.len(), 1).unwrap();
    for (i, value) in values.iter().enumerate() {
        capability.set(handle, i, 0, *value).unwrap();
    }
    let read = (0..values.len())
        .map(|i| capability.get(handle, i, 0).unwrap().to_bits())
        .collect();
    capability.free(handle).unwrap();
    read
}

fn small_matrix() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..7, 1usize..7).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(0u8..3, cols), rows).prop_map(|rows| {
            rows.into_iter()
                .map(|row| row.into_iter().map(f64::from).collect())
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn prop_direct_matches_reference(rows in small_matrix()) {
        let backend = DirectBackend::new();
        prop_assert_eq!(run(&backend, &rows), reference(&rows));
        prop_assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn prop_boundary_matches_direct(rows in small_matrix()) {
        let direct = DirectBackend::new();
        let boundary = BoundaryBackend::bootstrap(BackendConfig::default()).unwrap();
        prop_assert_eq!(run(&direct, &rows), run(&boundary, &rows));
    }

    #[test]
    fn prop_remote_search_matches_local(rows in small_matrix()) {
        let boundary = BoundaryBackend::bootstrap(BackendConfig::default()).unwrap();
        let matrix = OwnedMatrix::from_rows(&boundary, &rows).unwrap();
        let local = find_biggest_square(&boundary, matrix.handle()).unwrap();
        let remote = boundary.search_remote(matrix.handle()).unwrap();
        prop_assert!(local.same_square(&remote));
    }

    #[test]
    fn prop_cells_roundtrip(values in prop::collection::vec(any::<f64>(), 1..40)) {
        let direct = DirectBackend::new();
        let boundary = BoundaryBackend::bootstrap(BackendConfig::default()).unwrap();
        prop_assert_eq!(read_back(&direct, &values), bits(&values));
        prop_assert_eq!(read_back(&boundary, &values), bits(&values));
    }
}

#[test]
fn test_random_batch_matches_reference() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let inputs: Vec<Vec<Vec<f64>>> = (0..24)
        .map(|_| {
            let rows = rng.gen_range(1..12);
            let cols = rng.gen_range(1..12);
            (0..rows)
                .map(|_| (0..cols).map(|_| f64::from(rng.gen_range(0u8..2))).collect())
                .collect()
        })
        .collect();

    let backend = DirectBackend::new();
    let matrices: Vec<_> = inputs
        .iter()
        .map(|rows| OwnedMatrix::from_rows(&backend, rows).unwrap())
        .collect();
    let handles: Vec<_> = matrices.iter().map(|matrix| matrix.handle()).collect();

    for (rows, result) in inputs.iter().zip(search_batch(&backend, &handles)) {
        let result = result.unwrap();
        assert_eq!((result.row(), result.column(), result.size()), reference(rows));
    }
}

#[test]
fn test_boundary_batch_serializes_crossings() {
    let backend = BoundaryBackend::bootstrap(BackendConfig::default()).unwrap();
    let matrix = OwnedMatrix::filled(&backend, 10, 10, 3.0).unwrap();
    let handles = vec![matrix.handle(); 6];

    for result in search_batch(&backend, &handles) {
        assert_eq!(result.unwrap().size(), 10);
    }
}

//! Largest uniform square search
//!
//! Dynamic programming over a scratch matrix of square sizes, written purely
//! against [`MatrixCapability`] so that the identical code runs on any
//! backend. The scan goes bottom-right to top-left; `sizes[i][j]` is the side
//! of the largest uniform square whose top-left corner is `(i, j)`.

use crate::owned::OwnedMatrix;
use matsquare_core::{MatrixCapability, MatrixHandle, SearchResult};
use std::time::Instant;
use tracing::debug;

/// Find the largest square of identical values in `matrix`
///
/// The scratch matrix is created through `capability` and released on every
/// exit path. The input is only read.
///
/// Cells are visited in reverse row-major order and the running maximum is
/// replaced when `max <= s`, where `s` is the size of the square one step
/// smaller. Among squares of equal size the first one visited wins, i.e. the
/// bottom-most, then right-most. Every cell counts as a 1x1 square, so a
/// non-empty matrix without any uniform 2x2 block reports the bottom-right
/// cell with size 1. An empty matrix reports [`SearchResult::empty`].
///
/// # Errors
///
/// Returns the capability's error if any call fails, including allocation of
/// the scratch matrix. A failed search never yields a result.
pub fn find_biggest_square<C>(
    capability: &C,
    matrix: MatrixHandle,
) -> Result<SearchResult, C::Error>
where
    C: MatrixCapability + ?Sized,
{
    let started = Instant::now();
    let rows = capability.rows(matrix)?;
    let cols = capability.cols(matrix)?;
    debug!(%matrix, rows, cols, "searching for biggest square");

    let sizes = OwnedMatrix::create(capability, rows, cols)?;
    let scratch = sizes.handle();

    let mut max = 0i64;
    let mut best_row = -1i64;
    let mut best_col = -1i64;

    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            let below = i + 1 < rows;
            let right = j + 1 < cols;

            let v00 = capability.get(matrix, i, j)?;
            let v01 = if below { Some(capability.get(matrix, i + 1, j)?) } else { None };
            let v10 = if right { Some(capability.get(matrix, i, j + 1)?) } else { None };
            let v11 = if below && right {
                Some(capability.get(matrix, i + 1, j + 1)?)
            } else {
                None
            };

            let uniform = v01 == Some(v00) && v10 == v11 && v11 == Some(v00);
            let smaller = if uniform {
                let s10 = capability.get(scratch, i + 1, j)?;
                let s01 = capability.get(scratch, i, j + 1)?;
                let s11 = capability.get(scratch, i + 1, j + 1)?;
                s10.min(s01).min(s11)
            } else {
                0.0
            };

            capability.set(scratch, i, j, smaller + 1.0)?;

            let smaller = smaller as i64;
            if max <= smaller {
                max = smaller + 1;
                best_row = i as i64;
                best_col = j as i64;
            }
        }
    }

    drop(sizes);

    let elapsed_millis = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
    let result = if max == 0 {
        SearchResult::empty(elapsed_millis)
    } else {
        SearchResult::new(best_row, best_col, max, elapsed_millis)
    };
    debug!(
        row = result.row(),
        column = result.column(),
        size = result.size(),
        elapsed_millis,
        "biggest square found"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectBackend;

    fn search_rows(rows: &[Vec<f64>]) -> SearchResult {
        let backend = DirectBackend::new();
        let matrix = OwnedMatrix::from_rows(&backend, rows).unwrap();
        let result = find_biggest_square(&backend, matrix.handle()).unwrap();
        drop(matrix);
        assert_eq!(backend.live_handles(), 0);
        result
    }

    #[test]
    fn test_top_left_block() {
        let result = search_rows(&[
            vec![5.0, 5.0, 7.0],
            vec![5.0, 5.0, 7.0],
            vec![7.0, 7.0, 7.0],
        ]);
        assert_eq!((result.row(), result.column(), result.size()), (0, 0, 2));
    }

    #[test]
    fn test_uniform_matrix() {
        let result = search_rows(&vec![vec![3.0; 6]; 6]);
        assert_eq!((result.row(), result.column(), result.size()), (0, 0, 6));
    }

    #[test]
    fn test_rectangular_uniform_matrix() {
        // (0, 2), (0, 1) and (0, 0) all root a 3x3 square; (0, 2) is met first
        let result = search_rows(&vec![vec![1.0; 5]; 3]);
        assert_eq!((result.row(), result.column(), result.size()), (0, 2, 3));
    }

    #[test]
    fn test_single_cell() {
        let result = search_rows(&[vec![8.0]]);
        assert_eq!((result.row(), result.column(), result.size()), (0, 0, 1));
        assert!(result.elapsed_millis() >= 0);
    }

    #[test]
    fn test_no_uniform_block_reports_bottom_right() {
        let result = search_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!((result.row(), result.column(), result.size()), (1, 2, 1));
    }

    #[test]
    fn test_empty_matrix() {
        let backend = DirectBackend::new();
        let matrix = OwnedMatrix::create(&backend, 0, 0).unwrap();
        let result = find_biggest_square(&backend, matrix.handle()).unwrap();
        assert_eq!(result, SearchResult::empty(result.elapsed_millis()));
    }

    #[test]
    fn test_negative_values_on_last_row() {
        // -1.0 at the edges must not be mistaken for an absent neighbour
        let result = search_rows(&[vec![0.0, 1.0], vec![2.0, -1.0]]);
        assert_eq!((result.row(), result.column(), result.size()), (1, 1, 1));

        let result = search_rows(&[vec![-1.0]]);
        assert_eq!((result.row(), result.column(), result.size()), (0, 0, 1));
    }

    #[test]
    fn test_input_not_mutated() {
        let backend = DirectBackend::new();
        let rows = vec![vec![2.0, 2.0], vec![2.0, 2.0]];
        let matrix = OwnedMatrix::from_rows(&backend, &rows).unwrap();
        find_biggest_square(&backend, matrix.handle()).unwrap();
        assert_eq!(matrix.to_rows().unwrap(), rows);
    }
}

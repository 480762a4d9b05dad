//! Parallel searches over independent handles
//!
//! Each search owns its own scratch matrix, so searches over distinct handles
//! need no coordination beyond what the backend already does per call.

use crate::search::find_biggest_square;
use matsquare_core::{MatrixCapability, MatrixHandle, SearchResult};
use rayon::prelude::*;
use tracing::debug;

/// Search every handle in parallel, returning results in input order
///
/// One failing search does not stop the others; each slot carries its own
/// outcome.
pub fn search_batch<C>(
    capability: &C,
    handles: &[MatrixHandle],
) -> Vec<Result<SearchResult, C::Error>>
where
    C: MatrixCapability + Sync + ?Sized,
    C::Error: Send,
{
    debug!(
        searches = handles.len(),
        threads = rayon::current_num_threads(),
        "starting batch search"
    );
    handles
        .par_iter()
        .map(|handle| find_biggest_square(capability, *handle))
        .collect()
}

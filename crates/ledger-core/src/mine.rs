use crate::{constants::POW_BATCH_SIZE, pow::is_valid_proof};
use rayon::prelude::*;
use tracing::debug;

/// Parallel proof-of-work search. Returns the same minimal proof as
/// [`crate::pow::proof_of_work`].
///
/// Candidates are scanned in consecutive windows of `POW_BATCH_SIZE`; within a
/// window rayon's `find_first` keeps the lowest match, and a window is only
/// searched once every lower window came up empty.
pub fn proof_of_work_parallel(previous_proof: u64) -> u64 {
    let mut start = 1u64;
    loop {
        let end = start.saturating_add(POW_BATCH_SIZE);
        let found = (start..end)
            .into_par_iter()
            .find_first(|proof| is_valid_proof(previous_proof, *proof));

        if let Some(proof) = found {
            debug!(previous_proof, proof, "parallel search found proof");
            return proof;
        }
        start = end;
    }
}

use crate::{canonical_hash, pow::is_valid_proof, Block};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: previous_hash does not match the hash of its predecessor")]
    BrokenLink { index: u64 },
    #[error("block {index}: proof {proof} does not solve the puzzle for previous proof {previous_proof}")]
    InvalidProof {
        index: u64,
        proof: u64,
        previous_proof: u64,
    },
}

/// Check hash links and puzzle solutions for every adjacent pair.
///
/// The first block is taken as given, so an empty or single-block chain is
/// valid. Transaction contents are not checked.
pub fn validate_chain(chain: &[Block]) -> Result<(), ValidationError> {
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.previous_hash != canonical_hash(previous) {
            return Err(ValidationError::BrokenLink {
                index: current.index,
            });
        }

        if !is_valid_proof(previous.proof, current.proof) {
            return Err(ValidationError::InvalidProof {
                index: current.index,
                proof: current.proof,
                previous_proof: previous.proof,
            });
        }
    }
    Ok(())
}

pub fn is_chain_valid(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod canonical;
pub mod chain;
pub mod constants;
pub mod message;
pub mod mine;
pub mod node;
pub mod validate;

pub use chain::Chain;
pub use message::{Message, MessageError};
pub use node::{Messenger, Node, PeerId};
pub use validate::{is_chain_valid, validate_chain, ValidationError};

/// Unsigned value transfer. Nothing about it is validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Canonical bytes the block hash is computed over.
    pub fn canonical_encoding(&self) -> Vec<u8> {
        // Only strings and numbers inside; encoding into a Vec cannot fail.
        canonical::to_canonical_json(self).expect("block encodes to JSON")
    }

    pub fn hash(&self) -> String {
        canonical_hash(self)
    }
}

/// Hex SHA-256 of the block's canonical encoding.
pub fn canonical_hash(block: &Block) -> String {
    sha256_hex(&block.canonical_encoding())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Wall-clock seconds since the Unix epoch, with sub-second precision.
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

pub mod pow {
    use super::sha256_hex;
    use crate::constants::POW_PREFIX;

    /// Digest of the puzzle `proof^2 - previous_proof^2`, or `None` when the
    /// difference does not fit in an `i128`.
    pub fn puzzle_digest(previous_proof: u64, proof: u64) -> Option<String> {
        let prev = i128::from(previous_proof).checked_mul(i128::from(previous_proof))?;
        let new = i128::from(proof).checked_mul(i128::from(proof))?;
        let diff = new.checked_sub(prev)?;
        Some(sha256_hex(diff.to_string().as_bytes()))
    }

    pub fn is_valid_proof(previous_proof: u64, proof: u64) -> bool {
        puzzle_digest(previous_proof, proof)
            .map(|digest| digest.starts_with(POW_PREFIX))
            .unwrap_or(false)
    }

    /// Smallest proof >= 1 solving the puzzle for `previous_proof`.
    pub fn proof_of_work(previous_proof: u64) -> u64 {
        let mut proof = 1u64;
        while !is_valid_proof(previous_proof, proof) {
            proof += 1;
        }
        proof
    }
}

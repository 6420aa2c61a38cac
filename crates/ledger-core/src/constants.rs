pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_INDEX: u64 = 1;
pub const GENESIS_PROOF: u64 = 1;
/// Fixed so that independently started nodes share the same genesis hash.
pub const GENESIS_TIMESTAMP: f64 = 0.0;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Required hex prefix of the puzzle digest. Fixed; there is no retargeting.
pub const POW_PREFIX: &str = "0000";
/// Candidates scanned per window by the parallel proof-of-work search.
pub const POW_BATCH_SIZE: u64 = 1 << 16;

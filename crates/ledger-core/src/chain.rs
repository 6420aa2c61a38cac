use crate::{
    constants::{GENESIS_INDEX, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP},
    now_timestamp,
    validate::validate_chain,
    Block, Transaction,
};
use tracing::{info, warn};

/// In-memory chain plus the buffer of transactions waiting for the next block.
///
/// Never empty: it starts with a genesis block, grows only by appending and is
/// only ever replaced wholesale by a longer chain.
#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self {
            blocks: vec![genesis_block()],
            pending: Vec::new(),
        }
    }

    /// Seal the pending buffer into a new block and append it.
    pub fn create_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: now_timestamp(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.blocks.push(block.clone());
        block
    }

    /// Queue a transaction; returns the index of the block expected to carry it.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.push_transaction(Transaction::new(sender, receiver, amount))
    }

    pub fn push_transaction(&mut self, tx: Transaction) -> u64 {
        self.pending.push(tx);
        self.last_block().index + 1
    }

    /// Append without any validation. Used by the sync fast path.
    pub fn append_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Longest-chain rule: adopt `candidate` iff it is strictly longer than
    /// the local chain and valid. The pending buffer is left alone.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            info!(
                candidate = candidate.len(),
                local = self.blocks.len(),
                "received chain is not longer; keeping local chain"
            );
            return false;
        }

        if let Err(err) = validate_chain(&candidate) {
            warn!(
                candidate = candidate.len(),
                error = %err,
                "received chain is longer but invalid; keeping local chain"
            );
            return false;
        }

        info!(
            from = self.blocks.len(),
            to = candidate.len(),
            "chain replaced by longer valid chain"
        );
        self.blocks = candidate;
        true
    }

    pub fn last_block(&self) -> &Block {
        // `blocks` always holds at least the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true: a chain always holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Genesis block: index 1, proof 1, previous hash `"0"`, no transactions.
pub fn genesis_block() -> Block {
    Block {
        index: GENESIS_INDEX,
        timestamp: GENESIS_TIMESTAMP,
        transactions: vec![],
        proof: GENESIS_PROOF,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
    }
}

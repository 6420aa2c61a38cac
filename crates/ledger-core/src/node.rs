//! Consensus node: owns the chain, reacts to peer messages and runs the local
//! mining and transaction actions.

use crate::{
    chain::Chain, mine::proof_of_work_parallel, pow::proof_of_work, validate::is_chain_valid,
    Block, Message, Transaction,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub type PeerId = String;

/// Outbound half of the peer transport.
///
/// The transport hands inbound messages to [`Node::on_message`].
pub trait Messenger: Send + Sync {
    fn send(&self, peer: &PeerId, message: Message);
    fn broadcast(&self, message: Message);
}

pub struct Node<M> {
    chain: Mutex<Chain>,
    messenger: M,
    parallel_pow: bool,
}

impl<M: Messenger> Node<M> {
    pub fn new(messenger: M) -> Self {
        Self {
            chain: Mutex::new(Chain::new()),
            messenger,
            parallel_pow: false,
        }
    }

    /// Use the rayon search for mining. Same proofs, more cores.
    pub fn with_parallel_pow(mut self, enabled: bool) -> Self {
        self.parallel_pow = enabled;
        self
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Handle one decoded peer message.
    ///
    /// The chain lock is never held while calling into the messenger.
    pub fn on_message(&self, peer: &PeerId, message: Message) {
        debug!(peer = %peer, kind = message.kind(), "peer message");
        match message {
            Message::NewBlock { block } => self.on_new_block(peer, block),
            Message::NewTx { tx } => {
                self.chain.lock().push_transaction(tx);
            }
            Message::ChainRequest => {
                let chain = self.blocks();
                debug!(peer = %peer, length = chain.len(), "answering chain request");
                self.messenger.send(peer, Message::ChainResponse { chain });
            }
            Message::ChainResponse { chain } => {
                info!(peer = %peer, length = chain.len(), "received chain");
                self.chain.lock().replace_chain(chain);
            }
        }
    }

    /// Decode a raw wire message and handle it. Malformed input is dropped
    /// without touching state; returns whether the message was handled.
    pub fn on_wire_message(&self, peer: &PeerId, raw: &str) -> bool {
        match Message::decode(raw) {
            Ok(message) => {
                self.on_message(peer, message);
                true
            }
            Err(err) => {
                warn!(peer = %peer, error = %err, "dropping peer message");
                false
            }
        }
    }

    fn on_new_block(&self, peer: &PeerId, block: Block) {
        let index = block.index;
        let appended = {
            let mut chain = self.chain.lock();
            if block.previous_hash == chain.last_block().hash() {
                // Fast path: the block's proof is not re-checked here, only
                // its link to our head. Full chains always go through
                // `replace_chain` validation.
                chain.append_block(block);
                true
            } else {
                false
            }
        };

        if appended {
            info!(peer = %peer, index, "block extends local chain");
        } else {
            info!(peer = %peer, index, "block does not extend local chain; requesting chain");
            self.messenger.send(peer, Message::ChainRequest);
        }
    }

    /// Mine a block on top of the current head and broadcast it.
    ///
    /// The search runs without the chain lock. If the head moves meanwhile
    /// (a peer block or a chain replacement), the solution is stale and the
    /// search restarts from the new head.
    pub fn mine(&self) -> Block {
        let (mut previous_proof, mut previous_hash) = self.head();
        loop {
            let proof = if self.parallel_pow {
                proof_of_work_parallel(previous_proof)
            } else {
                proof_of_work(previous_proof)
            };

            let mut chain = self.chain.lock();
            let (head_proof, head_hash) = {
                let last = chain.last_block();
                (last.proof, last.hash())
            };
            if head_hash == previous_hash {
                let block = chain.create_block(proof, previous_hash);
                drop(chain);
                info!(index = block.index, proof = block.proof, txs = block.transactions.len(), "mined block");
                self.messenger.broadcast(Message::NewBlock {
                    block: block.clone(),
                });
                return block;
            }
            drop(chain);

            debug!(stale_proof = proof, "head moved during search; mining again");
            previous_proof = head_proof;
            previous_hash = head_hash;
        }
    }

    /// Queue a transaction locally and broadcast it. Returns the index of the
    /// block expected to carry it.
    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> u64 {
        let tx = Transaction::new(sender, receiver, amount);
        let index = self.chain.lock().push_transaction(tx.clone());
        self.messenger.broadcast(Message::NewTx { tx });
        index
    }

    /// Ask a freshly connected peer for its chain.
    pub fn on_peer_connected(&self, peer: &PeerId) {
        info!(peer = %peer, "peer connected; requesting chain");
        self.messenger.send(peer, Message::ChainRequest);
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.chain.lock().blocks().to_vec()
    }

    pub fn last_block(&self) -> Block {
        self.chain.lock().last_block().clone()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.chain.lock().pending().to_vec()
    }

    pub fn len(&self) -> usize {
        self.chain.lock().len()
    }

    /// Never true; see [`Chain::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.chain.lock().is_empty()
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(self.chain.lock().blocks())
    }

    /// Proof and hash of the current head.
    pub fn head(&self) -> (u64, String) {
        let chain = self.chain.lock();
        let last = chain.last_block();
        (last.proof, last.hash())
    }
}

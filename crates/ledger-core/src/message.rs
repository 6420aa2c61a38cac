//! Peer wire messages.
//!
//! JSON objects tagged by `"type"`, field-compatible with other node
//! implementations:
//!
//! ```json
//! {"type": "NEW_BLOCK", "block": {...}}
//! {"type": "NEW_TX", "tx": {"sender": "a", "receiver": "b", "amount": 1.0}}
//! {"type": "REQUEST_CHAIN"}
//! {"type": "CHAIN_RESPONSE", "chain": [{...}, ...]}
//! ```

use crate::{Block, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "NEW_BLOCK")]
    NewBlock { block: Block },
    #[serde(rename = "NEW_TX")]
    NewTx { tx: Transaction },
    #[serde(rename = "REQUEST_CHAIN", alias = "CHAIN_REQUEST")]
    ChainRequest,
    #[serde(rename = "CHAIN_RESPONSE")]
    ChainResponse { chain: Vec<Block> },
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed peer message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Message {
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn encode(&self) -> String {
        // Plain data only; serializing to a String cannot fail.
        serde_json::to_string(self).expect("message encodes to JSON")
    }

    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::NewBlock { .. } => "NEW_BLOCK",
            Message::NewTx { .. } => "NEW_TX",
            Message::ChainRequest => "REQUEST_CHAIN",
            Message::ChainResponse { .. } => "CHAIN_RESPONSE",
        }
    }
}

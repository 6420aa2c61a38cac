//! Local HTTP command surface: submit transactions, mine, inspect the chain
//! and manage peers.

use crate::p2p::{self, SharedNode};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, Transaction};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub node: SharedNode,
}

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChainView {
    pub length: usize,
    pub chain: Vec<Block>,
}

#[derive(Serialize, Deserialize)]
pub struct Head {
    pub height: u64,
    pub hash: String,
}

#[derive(Serialize, Deserialize)]
pub struct Validity {
    pub valid: bool,
}

#[derive(Serialize, Deserialize)]
pub struct TxIn {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
}

#[derive(Serialize, Deserialize)]
pub struct TxAccepted {
    pub index: u64,
    pub tx: Transaction,
}

#[derive(Serialize, Deserialize)]
pub struct Mined {
    pub block: Block,
    pub hash: String,
}

#[derive(Serialize, Deserialize)]
pub struct ConnectIn {
    pub addr: String,
}

#[derive(Serialize, Deserialize)]
pub struct Connected {
    pub peer: String,
}

#[derive(Serialize, Deserialize)]
pub struct Peers {
    pub peers: Vec<String>,
}

/// Handler failure rendered as `{ "error": ... }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(chain))
        .route("/chain/head", get(head))
        .route("/chain/valid", get(valid))
        .route("/mempool", get(mempool))
        .route("/tx", post(submit_tx))
        .route("/mine", post(mine))
        .route("/peers", get(list_peers).post(connect_peer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn chain(State(state): State<AppState>) -> Json<ChainView> {
    let chain = state.node.blocks();
    Json(ChainView {
        length: chain.len(),
        chain,
    })
}

async fn head(State(state): State<AppState>) -> Json<Head> {
    let last = state.node.last_block();
    Json(Head {
        height: last.index,
        hash: last.hash(),
    })
}

async fn valid(State(state): State<AppState>) -> Json<Validity> {
    Json(Validity {
        valid: state.node.is_valid(),
    })
}

async fn mempool(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.node.pending())
}

async fn submit_tx(State(state): State<AppState>, Json(tx): Json<TxIn>) -> Json<TxAccepted> {
    let index = state
        .node
        .submit_transaction(tx.sender.clone(), tx.receiver.clone(), tx.amount);
    Json(TxAccepted {
        index,
        tx: Transaction::new(tx.sender, tx.receiver, tx.amount),
    })
}

async fn mine(State(state): State<AppState>) -> Result<Json<Mined>, ApiError> {
    let node = state.node.clone();
    let block = tokio::task::spawn_blocking(move || node.mine())
        .await
        .map_err(|err| {
            warn!(error = %err, "mining task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "mining task failed")
        })?;
    let hash = block.hash();
    Ok(Json(Mined { block, hash }))
}

async fn list_peers(State(state): State<AppState>) -> Json<Peers> {
    Json(Peers {
        peers: state.node.messenger().peers(),
    })
}

async fn connect_peer(
    State(state): State<AppState>,
    Json(req): Json<ConnectIn>,
) -> Result<Json<Connected>, ApiError> {
    let peer = p2p::connect(&req.addr, state.node.clone())
        .await
        .map_err(|err| ApiError::new(StatusCode::BAD_GATEWAY, format!("{err:#}")))?;
    Ok(Json(Connected { peer }))
}

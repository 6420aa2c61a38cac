use ledger_core::Node;
use ledger_node::{
    api::{self, AppState, ChainView, Connected, Head, Health, Mined, Peers, TxAccepted, Validity},
    p2p::PeerHub,
};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_api() -> String {
    let node = Arc::new(Node::new(PeerHub::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::router(AppState { node });
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_and_genesis() -> anyhow::Result<()> {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let health: Health = client.get(format!("{base}/health")).send().await?.json().await?;
    assert_eq!(health.status, "ok");

    let chain: ChainView = client.get(format!("{base}/chain")).send().await?.json().await?;
    assert_eq!(chain.length, 1);
    assert_eq!(chain.chain[0].previous_hash, "0");

    let head: Head = client.get(format!("{base}/chain/head")).send().await?.json().await?;
    assert_eq!(head.height, 1);
    assert_eq!(head.hash, chain.chain[0].hash());
    Ok(())
}

#[tokio::test]
async fn test_submit_then_mine() -> anyhow::Result<()> {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let accepted: TxAccepted = client
        .post(format!("{base}/tx"))
        .json(&json!({ "sender": "alice", "receiver": "bob", "amount": 4.25 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(accepted.index, 2);

    let mempool: Vec<ledger_core::Transaction> =
        client.get(format!("{base}/mempool")).send().await?.json().await?;
    assert_eq!(mempool, vec![accepted.tx.clone()]);

    let mined: Mined = client.post(format!("{base}/mine")).send().await?.json().await?;
    assert_eq!(mined.block.index, 2);
    assert_eq!(mined.block.proof, 533);
    assert_eq!(mined.block.transactions, vec![accepted.tx]);
    assert_eq!(mined.hash, mined.block.hash());

    let validity: Validity = client.get(format!("{base}/chain/valid")).send().await?.json().await?;
    assert!(validity.valid);
    Ok(())
}

#[tokio::test]
async fn test_bad_requests() -> anyhow::Result<()> {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/tx"))
        .json(&json!({ "sender": "alice" }))
        .send()
        .await?;
    assert!(res.status().is_client_error());

    // Nothing listens on port 1.
    let res = client
        .post(format!("{base}/peers"))
        .json(&json!({ "addr": "127.0.0.1:1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await?;
    assert!(body["error"].as_str().unwrap().contains("127.0.0.1:1"));

    let peers: Peers = client.get(format!("{base}/peers")).send().await?.json().await?;
    assert!(peers.peers.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_connect_two_nodes_via_api() -> anyhow::Result<()> {
    let a = Arc::new(Node::new(PeerHub::new()));
    let p2p_listener = TcpListener::bind("127.0.0.1:0").await?;
    let a_p2p = p2p_listener.local_addr()?;
    tokio::spawn(ledger_node::p2p::serve(p2p_listener, a.clone()));

    let base = spawn_api().await;
    let client = reqwest::Client::new();
    let connected: Connected = client
        .post(format!("{base}/peers"))
        .json(&json!({ "addr": a_p2p.to_string() }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(connected.peer, a_p2p.to_string());

    let peers: Peers = client.get(format!("{base}/peers")).send().await?.json().await?;
    assert_eq!(peers.peers, vec![a_p2p.to_string()]);
    Ok(())
}

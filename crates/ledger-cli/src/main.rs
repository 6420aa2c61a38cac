use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the node's pending buffer
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Receiver
        #[arg(long)]
        receiver: String,
        /// Amount
        #[arg(long)]
        amount: f64,
    },
    /// Mine a block from the pending buffer and broadcast it
    Mine,
    /// Print the full chain
    Chain,
    /// Print the head height and hash
    Head,
    /// Check the node's own chain
    Valid,
    /// Print pending transactions
    Mempool,
    /// Dial a peer (host:port of its p2p listener)
    Connect {
        addr: String,
    },
    /// List connected peers
    Peers,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: f64,
}

#[derive(Serialize)]
struct ConnectReq {
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let node = cli.node.trim_end_matches('/').to_string();
    debug!(node = %node, cmd = ?cli.cmd, "sending request");

    let res = match cli.cmd {
        Command::Submit {
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount,
            };
            client.post(format!("{node}/tx")).json(&tx).send().await
        }
        Command::Mine => client.post(format!("{node}/mine")).send().await,
        Command::Chain => client.get(format!("{node}/chain")).send().await,
        Command::Head => client.get(format!("{node}/chain/head")).send().await,
        Command::Valid => client.get(format!("{node}/chain/valid")).send().await,
        Command::Mempool => client.get(format!("{node}/mempool")).send().await,
        Command::Connect { addr } => {
            client
                .post(format!("{node}/peers"))
                .json(&ConnectReq { addr })
                .send()
                .await
        }
        Command::Peers => client.get(format!("{node}/peers")).send().await,
    }
    .with_context(|| format!("request to {node} failed"))?;

    print_response(res).await
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit() {
        let cli = Cli::try_parse_from([
            "ledger-cli",
            "submit",
            "--sender",
            "alice",
            "--receiver",
            "bob",
            "--amount",
            "2.5",
        ])
        .unwrap();
        assert_eq!(cli.node, "http://127.0.0.1:8080");
        match cli.cmd {
            Command::Submit {
                sender,
                receiver,
                amount,
            } => {
                assert_eq!(sender, "alice");
                assert_eq!(receiver, "bob");
                assert_eq!(amount, 2.5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_connect_with_node_override() {
        let cli = Cli::try_parse_from([
            "ledger-cli",
            "connect",
            "127.0.0.1:9001",
            "--node",
            "http://127.0.0.1:8081",
        ])
        .unwrap();
        assert_eq!(cli.node, "http://127.0.0.1:8081");
        assert!(matches!(cli.cmd, Command::Connect { addr } if addr == "127.0.0.1:9001"));
    }
}

use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain sync")]
pub struct Args {
    /// Address for the local HTTP command API, e.g. 127.0.0.1:8080
    #[arg(long, env = "LEDGER_HTTP_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Address peers connect to
    #[arg(long, env = "LEDGER_P2P_LISTEN", default_value = "127.0.0.1:9000")]
    pub p2p_listen: SocketAddr,

    /// Peer to dial at startup (repeatable)
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Spread the proof-of-work search over all cores
    #[arg(long)]
    pub parallel_pow: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["ledger-node"]).unwrap();
        assert_eq!(args.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(args.p2p_listen, "127.0.0.1:9000".parse().unwrap());
        assert!(args.peers.is_empty());
        assert!(!args.parallel_pow);
    }

    #[test]
    fn peers_repeat_and_split() {
        let args = Args::try_parse_from([
            "ledger-node",
            "--peer",
            "127.0.0.1:9001,127.0.0.1:9002",
            "--peer",
            "127.0.0.1:9003",
            "--parallel-pow",
        ])
        .unwrap();
        assert_eq!(
            args.peers,
            vec!["127.0.0.1:9001", "127.0.0.1:9002", "127.0.0.1:9003"]
        );
        assert!(args.parallel_pow);
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Args::try_parse_from(["ledger-node", "--listen", "nowhere"]).is_err());
    }
}

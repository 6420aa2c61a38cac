//! TCP peer transport: newline-delimited JSON, one message per line.

use anyhow::{Context, Result};
use ledger_core::{Message, Messenger, Node, PeerId};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tracing::{debug, info, warn};

/// Longest accepted inbound line; a peer exceeding it is disconnected.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

pub type SharedNode = Arc<Node<PeerHub>>;

/// Identifies one TCP connection, so a closed connection only ever
/// deregisters itself and never a newer one to the same peer address.
type ConnId = u64;

struct PeerQueue {
    conn: ConnId,
    tx: mpsc::UnboundedSender<Message>,
}

/// Outbound queues for every connected peer.
#[derive(Default)]
pub struct PeerHub {
    peers: RwLock<HashMap<PeerId, PeerQueue>>,
    next_conn: AtomicU64,
}

impl PeerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.peers.read().keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Register a connection. A previous connection to the same peer is
    /// replaced; its queue is dropped, which ends its writer.
    fn register(&self, peer: &PeerId) -> (ConnId, mpsc::UnboundedReceiver<Message>) {
        let conn = self.next_conn.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(old) = self.peers.write().insert(peer.clone(), PeerQueue { conn, tx }) {
            info!(peer = %peer, old = old.conn, new = conn, "replacing peer connection");
        }
        (conn, rx)
    }

    fn deregister(&self, peer: &PeerId, conn: ConnId) {
        let mut peers = self.peers.write();
        if peers.get(peer).is_some_and(|queue| queue.conn == conn) {
            peers.remove(peer);
        }
    }
}

impl Messenger for PeerHub {
    fn send(&self, peer: &PeerId, message: Message) {
        match self.peers.read().get(peer) {
            Some(queue) => {
                if queue.tx.send(message).is_err() {
                    debug!(peer = %peer, "peer queue closed");
                }
            }
            None => warn!(peer = %peer, kind = message.kind(), "send to unknown peer dropped"),
        }
    }

    fn broadcast(&self, message: Message) {
        for (peer, queue) in self.peers.read().iter() {
            if queue.tx.send(message.clone()).is_err() {
                debug!(peer = %peer, "peer queue closed");
            }
        }
    }
}

/// Accept inbound peers until the listener fails.
pub async fn serve(listener: TcpListener, node: SharedNode) -> Result<()> {
    info!(addr = %listener.local_addr()?, "p2p listening");
    loop {
        let (stream, addr) = listener.accept().await?;
        let peer: PeerId = addr.to_string();
        info!(peer = %peer, "inbound peer");
        let (conn, outbound) = node.messenger().register(&peer);
        tokio::spawn(run_connection(stream, peer, conn, node.clone(), outbound));
    }
}

/// Dial a peer and ask it for its chain.
pub async fn connect(addr: &str, node: SharedNode) -> Result<PeerId> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("connecting to peer {addr}"))?;
    let peer: PeerId = stream.peer_addr()?.to_string();
    let (conn, outbound) = node.messenger().register(&peer);
    node.on_peer_connected(&peer);
    tokio::spawn(run_connection(stream, peer.clone(), conn, node, outbound));
    Ok(peer)
}

async fn run_connection(
    stream: TcpStream,
    peer: PeerId,
    conn: ConnId,
    node: SharedNode,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let (reader, mut writer) = stream.into_split();

    let writer_peer = peer.clone();
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let mut line = message.encode();
            line.push('\n');
            if let Err(err) = writer.write_all(line.as_bytes()).await {
                warn!(peer = %writer_peer, error = %err, "write to peer failed");
                break;
            }
        }
    });

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match read_line_capped(&mut reader, &mut buf, MAX_LINE_BYTES).await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                // Chain responses re-hash every block under the chain lock.
                let (handler, from) = (node.clone(), peer.clone());
                let handled =
                    tokio::task::spawn_blocking(move || handler.on_wire_message(&from, &line));
                if let Err(err) = handled.await {
                    warn!(peer = %peer, error = %err, "message handler failed");
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(peer = %peer, error = %err, "read from peer failed");
                break;
            }
        }
    }

    // Dropping the queue sender also ends the writer task.
    node.messenger().deregister(&peer, conn);
    info!(peer = %peer, "peer disconnected");
}

/// Read one `\n`-terminated line of at most `max` bytes, without the
/// terminator. `Ok(None)` at end of stream; an overlong line is an error.
async fn read_line_capped<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<Option<String>> {
    buf.clear();
    let mut limited = (&mut *reader).take(max as u64 + 1);
    let read = limited.read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if read > max {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {max} bytes"),
        ));
    }
    String::from_utf8(std::mem::take(buf))
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#![allow(dead_code)]

use ledger_core::{Message, Messenger, Node, PeerId};
use parking_lot::Mutex;

/// Where a recorded message was headed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    To(PeerId, Message),
    Broadcast(Message),
}

impl Outbound {
    pub fn into_message(self) -> Message {
        match self {
            Outbound::To(_, message) | Outbound::Broadcast(message) => message,
        }
    }
}

/// Messenger that just records what the node sends.
#[derive(Default)]
pub struct Mailbox {
    outbox: Mutex<Vec<Outbound>>,
}

impl Mailbox {
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

impl Messenger for Mailbox {
    fn send(&self, peer: &PeerId, message: Message) {
        self.outbox.lock().push(Outbound::To(peer.clone(), message));
    }

    fn broadcast(&self, message: Message) {
        self.outbox.lock().push(Outbound::Broadcast(message));
    }
}

pub type TestNode = Node<Mailbox>;

pub fn test_node() -> TestNode {
    Node::new(Mailbox::default())
}

/// Hand everything `from` has queued to `to`, which knows `from` as `from_id`.
/// Returns how many messages were delivered.
pub fn deliver(from: &TestNode, to: &TestNode, from_id: &str) -> usize {
    let outbox = from.messenger().take();
    let count = outbox.len();
    let peer = from_id.to_string();
    for out in outbox {
        to.on_message(&peer, out.into_message());
    }
    count
}

/// Exchange messages between two connected nodes until both go quiet.
pub fn pump(a: &TestNode, a_id: &str, b: &TestNode, b_id: &str) {
    loop {
        let delivered = deliver(a, b, a_id) + deliver(b, a, b_id);
        if delivered == 0 {
            break;
        }
    }
}

/// Forget anything queued while the node was "offline".
pub fn drop_outbox(node: &TestNode) {
    node.messenger().take();
}

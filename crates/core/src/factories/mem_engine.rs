//! The in-memory stub engine provided by blockswap.

use blockswap_api::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type OutboxSend = tokio::sync::mpsc::UnboundedSender<DeliveryRecv>;
type OutboxRecv = tokio::sync::mpsc::UnboundedReceiver<DeliveryRecv>;

/// What the ledger knows about one peer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemLedgerEntry {
    /// Number of messages recorded as sent.
    pub messages: u64,

    /// Number of blocks in those messages.
    pub blocks: u64,

    /// Raw bytes of those blocks.
    pub bytes: u64,
}

/// An in-memory engine with no scheduling policy of its own.
/// This is NOT a production module. It is for testing only.
///
/// Delivery units are published in the order they are handed in, each
/// on its own per-peer delivery channel.
#[derive(Debug)]
pub struct MemEngine {
    outbox_send: Mutex<Option<OutboxSend>>,
    outbox_recv: tokio::sync::Mutex<OutboxRecv>,
    ledger: Mutex<HashMap<PeerId, MemLedgerEntry>>,
    ledger_error: Mutex<bool>,
}

impl MemEngine {
    /// Construct a new MemEngine.
    pub fn create() -> Arc<Self> {
        let (outbox_send, outbox_recv) = tokio::sync::mpsc::unbounded_channel();
        Arc::new(Self {
            outbox_send: Mutex::new(Some(outbox_send)),
            outbox_recv: tokio::sync::Mutex::new(outbox_recv),
            ledger: Mutex::new(HashMap::new()),
            ledger_error: Mutex::new(false),
        })
    }

    /// Publish a delivery channel carrying `unit`.
    /// Returns false if the engine has been shut down.
    pub fn publish(&self, unit: DeliveryUnit) -> bool {
        let (send, recv) = tokio::sync::oneshot::channel();
        // the receiver is still held right here
        let _ = send.send(unit);
        self.publish_recv(recv)
    }

    /// Publish a delivery channel whose unit is not decided yet.
    /// Dropping the returned sender closes the channel empty.
    /// Returns None if the engine has been shut down.
    pub fn publish_pending(
        &self,
    ) -> Option<tokio::sync::oneshot::Sender<DeliveryUnit>> {
        let (send, recv) = tokio::sync::oneshot::channel();
        self.publish_recv(recv).then_some(send)
    }

    /// Publish a delivery channel that closes without yielding a unit.
    /// Returns false if the engine has been shut down.
    pub fn publish_empty(&self) -> bool {
        self.publish_pending().is_some()
    }

    /// Stop publishing. Channels already published can still be taken.
    pub fn shutdown(&self) {
        self.outbox_send.lock().unwrap().take();
    }

    /// Make every following ledger update fail (or succeed again).
    pub fn set_ledger_error(&self, fail: bool) {
        *self.ledger_error.lock().unwrap() = fail;
    }

    /// The ledger entry for `peer`.
    pub fn ledger(&self, peer: &PeerId) -> MemLedgerEntry {
        self.ledger
            .lock()
            .unwrap()
            .get(peer)
            .copied()
            .unwrap_or_default()
    }

    fn publish_recv(&self, recv: DeliveryRecv) -> bool {
        match self.outbox_send.lock().unwrap().as_ref() {
            Some(send) => send.send(recv).is_ok(),
            None => false,
        }
    }
}

impl Engine for MemEngine {
    fn next_outbox(&self) -> BoxFut<'_, Option<DeliveryRecv>> {
        Box::pin(async move { self.outbox_recv.lock().await.recv().await })
    }

    fn message_sent(&self, peer: PeerId, message: BlockMessage) -> BsResult<()> {
        if *self.ledger_error.lock().unwrap() {
            return Err(BsError::other("ledger unavailable"));
        }
        let mut lock = self.ledger.lock().unwrap();
        let entry = lock.entry(peer).or_default();
        entry.messages += 1;
        entry.blocks += message.blocks().len() as u64;
        entry.bytes += message.data_len() as u64;
        Ok(())
    }
}

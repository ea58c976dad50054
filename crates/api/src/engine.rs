//! The engine decides which peer receives which block and keeps the
//! per-peer ledger. Scheduling policy is up to the implementation, the
//! workers only consume its outbox.

use crate::*;
use std::sync::Arc;

/// Scheduled instruction to deliver one block to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryUnit {
    /// The receiving peer.
    pub peer: PeerId,

    /// The block to deliver.
    pub block: Block,
}

impl DeliveryUnit {
    /// Construct a new delivery unit.
    pub fn new(peer: PeerId, block: Block) -> Self {
        Self { peer, block }
    }
}

/// A per-peer delivery channel published by the engine.
///
/// Each channel carries at most one unit. A channel whose sender is
/// dropped without sending simply means there was nothing left to send
/// to that peer.
pub type DeliveryRecv = tokio::sync::oneshot::Receiver<DeliveryUnit>;

/// The engine api consumed by the task workers.
#[cfg_attr(feature = "mockall", mockall::automock)]
pub trait Engine: 'static + Send + Sync + std::fmt::Debug {
    /// Wait for the next per-peer delivery channel.
    ///
    /// Multiple task workers call this concurrently. Every published
    /// channel must be handed to exactly one caller.
    ///
    /// Resolves to `None` once the engine has shut down and no more
    /// channels will ever be published.
    fn next_outbox(&self) -> BoxFut<'_, Option<DeliveryRecv>>;

    /// Record in the ledger that `message` was sent to `peer`.
    ///
    /// This is called before the message is actually handed to the
    /// network, regardless of whether that send later succeeds.
    fn message_sent(&self, peer: PeerId, message: BlockMessage) -> BsResult<()>;
}

/// Trait-object [Engine].
pub type DynEngine = Arc<dyn Engine>;

//! The want manager tracks the blocks this node wants and performs the
//! actual network send of blocks to peers.

use crate::*;
use std::sync::Arc;

/// The want manager api consumed by the workers.
#[cfg_attr(feature = "mockall", mockall::automock)]
pub trait WantManager: 'static + Send + Sync + std::fmt::Debug {
    /// Send the block in `unit` to its peer.
    ///
    /// May block until the block is delivered or `scope` is cancelled.
    /// Failures are the implementation's concern, nothing is reported back.
    fn send_block(
        &self,
        scope: scope::CancellationToken,
        unit: DeliveryUnit,
    ) -> BoxFut<'_, ()>;

    /// Number of entries currently in the want-list.
    fn want_count(&self) -> usize;

    /// A point-in-time snapshot of the want-list entries.
    fn want_entries(&self) -> Vec<WantEntry>;
}

/// Trait-object [WantManager].
pub type DynWantManager = Arc<dyn WantManager>;

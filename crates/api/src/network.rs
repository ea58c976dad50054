//! Transport level provider discovery and connection primitives.

use crate::*;
use std::sync::Arc;

/// Incremental stream of discovered providers.
///
/// The sender is dropped once the lookup has concluded, has found the
/// requested number of providers, or its scope was cancelled.
pub type ProviderRecv = tokio::sync::mpsc::Receiver<PeerId>;

/// The network api consumed by the provider query manager.
#[cfg_attr(feature = "mockall", mockall::automock)]
pub trait Network: 'static + Send + Sync + std::fmt::Debug {
    /// Start looking for up to `max` peers advertising `key`.
    ///
    /// Returns immediately. Providers are yielded as they are found.
    fn find_providers(
        &self,
        scope: scope::CancellationToken,
        key: ContentId,
        max: usize,
    ) -> ProviderRecv;

    /// Establish a connection to `peer`.
    fn connect_to(
        &self,
        scope: scope::CancellationToken,
        peer: PeerId,
    ) -> BoxFut<'_, BsResult<()>>;
}

/// Trait-object [Network].
pub type DynNetwork = Arc<dyn Network>;

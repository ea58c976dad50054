//! Provider discovery requests.

use crate::{scope::CancellationToken, ContentId};

/// A request to discover providers of a content id.
///
/// The scope belongs to the creator of the request. Cancelling it before
/// the request is admitted causes it to be dropped. Cancelling it after
/// admission cuts the discovery short.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    /// The content to find providers for.
    pub key: ContentId,

    /// The cancellation scope of the request.
    pub scope: CancellationToken,
}

impl DiscoveryRequest {
    /// Construct a new discovery request.
    pub fn new(key: ContentId, scope: CancellationToken) -> Self {
        Self { key, scope }
    }
}

/// Sender side of the discovery intake queue.
pub type IntakeSend = tokio::sync::mpsc::Sender<DiscoveryRequest>;

/// Receiver side of the discovery intake queue.
pub type IntakeRecv = tokio::sync::mpsc::Receiver<DiscoveryRequest>;

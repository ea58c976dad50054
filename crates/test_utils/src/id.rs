//! Test utilities associated with ids.

use blockswap_api::{id::Id, ContentId, PeerId};
use bytes::Bytes;

use crate::random_bytes;

/// Create a random id.
pub fn random_id() -> Id {
    Id(Bytes::from(random_bytes(32)))
}

/// Create a random content id.
pub fn random_content_id() -> ContentId {
    ContentId(random_id())
}

/// Create a random peer id.
pub fn random_peer_id() -> PeerId {
    PeerId(random_id())
}

/// Create a list of random content ids.
pub fn create_content_id_list(count: usize) -> Vec<ContentId> {
    (0..count).map(|_| random_content_id()).collect()
}

/// Create a list of random peer ids.
pub fn create_peer_id_list(count: usize) -> Vec<PeerId> {
    (0..count).map(|_| random_peer_id()).collect()
}

#![deny(missing_docs)]
//! Blockswap API contains the collaborator traits and the basic types
//! required by the block exchange worker subsystem.
//!
//! If you want the workers themselves, please see the blockswap_core crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub(crate) mod serde_bytes_base64 {
    pub fn serialize<S>(
        b: &bytes::Bytes,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use base64::prelude::*;
        serializer.serialize_str(&BASE64_URL_SAFE_NO_PAD.encode(b))
    }

    pub fn deserialize<'de, D, T: From<bytes::Bytes>>(
        deserializer: D,
    ) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use base64::prelude::*;
        let s: &'de str = serde::Deserialize::deserialize(deserializer)?;
        BASE64_URL_SAFE_NO_PAD
            .decode(s)
            .map(|v| bytes::Bytes::copy_from_slice(&v).into())
            .map_err(serde::de::Error::custom)
    }
}

pub mod config;

mod error;
pub use error::*;

pub mod id;
pub use id::{ContentId, PeerId};

mod block;
pub use block::*;

mod message;
pub use message::*;

pub mod scope;

pub mod discovery;
pub use discovery::*;

pub mod engine;
pub use engine::*;

pub mod want_manager;
pub use want_manager::*;

pub mod network;
pub use network::*;

pub mod workers;
pub use workers::*;

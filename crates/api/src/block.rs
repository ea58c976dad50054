use crate::ContentId;

/// One immutable block of data, named by its [ContentId].
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    cid: ContentId,
    #[serde(with = "crate::serde_bytes_base64")]
    data: bytes::Bytes,
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("cid", &self.cid)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Block {
    /// Construct a block, deriving its content id from the data.
    pub fn new(data: impl Into<bytes::Bytes>) -> Self {
        let data = data.into();
        Self {
            cid: ContentId::hash_of(&data),
            data,
        }
    }

    /// Construct a block with an already known content id.
    /// The id is trusted as given and not re-derived.
    pub fn with_cid(cid: ContentId, data: impl Into<bytes::Bytes>) -> Self {
        Self {
            cid,
            data: data.into(),
        }
    }

    /// The content id naming this block.
    pub fn cid(&self) -> &ContentId {
        &self.cid
    }

    /// The raw block bytes.
    pub fn raw_data(&self) -> &bytes::Bytes {
        &self.data
    }

    /// Length of the raw block data in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if this block carries no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An entry in the local want-list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WantEntry {
    /// The wanted content.
    pub cid: ContentId,

    /// Relative priority, higher is more urgent.
    pub priority: i32,
}

impl WantEntry {
    /// Construct a want-list entry.
    pub fn new(cid: ContentId, priority: i32) -> Self {
        Self { cid, priority }
    }
}

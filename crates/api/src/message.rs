use crate::{Block, ContentId};

/// An outgoing exchange message, as seen by the ledger.
///
/// Encoding is left to the message codec. The workers only build these
/// to report what was sent to a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMessage {
    full: bool,
    blocks: Vec<Block>,
}

impl BlockMessage {
    /// Construct an empty message. A `full` message replaces the
    /// receiver's view of our want-list instead of updating it.
    pub fn new(full: bool) -> Self {
        Self {
            full,
            blocks: Vec::new(),
        }
    }

    /// Construct a non-full message carrying exactly one block.
    pub fn single(block: Block) -> Self {
        let mut out = Self::new(false);
        out.add_block(block);
        out
    }

    /// Append a block.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Is this a full want-list message?
    pub fn full(&self) -> bool {
        self.full
    }

    /// The blocks carried by this message.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total raw data bytes carried by this message.
    pub fn data_len(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// True if this message carries the block named by `cid`.
    pub fn carries(&self, cid: &ContentId) -> bool {
        self.blocks.iter().any(|b| b.cid() == cid)
    }
}

//! Test utilities associated with blocks.

use blockswap_api::Block;

use crate::random_bytes;

/// Create a block of `len` random bytes.
pub fn random_block(len: usize) -> Block {
    Block::new(random_bytes(len))
}

/// Create `count` random blocks with lengths cycling through 1..=max_len.
pub fn create_block_list(count: usize, max_len: usize) -> Vec<Block> {
    (0..count)
        .map(|i| random_block(i % max_len.max(1) + 1))
        .collect()
}

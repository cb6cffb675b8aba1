//! Synthetic block generators, used to exercise the scanning pipeline
//! against linear chains, forks-of-forks, and out-of-order arrival without
//! needing a real `blk*.dat` file.

use std::sync::atomic::{AtomicI64, Ordering};

use bytes::Bytes;
use chainscan_chain::{Block, Hash, GENESIS_PREV_HASH};
use chrono::{Duration, TimeZone, Utc};

/// The nonce `gen_artificial_chain_with_forks` gives every forked block, so
/// tests can recognise a forked block on sight.
pub const FORKED_NONCE: u32 = 0xFFFF_FFFF;

static BLOCK_COUNTER: AtomicI64 = AtomicI64::new(0);

/// Builds one well-formed, zero-transaction block at `height`, chained onto
/// `prev_block_hash`. Each call advances a monotonically increasing
/// timestamp, so successive blocks (even on different forks) never share a
/// timestamp.
pub fn make_block(height: i64, prev_block_hash: Hash, nonce: Option<u32>) -> Block {
    let counter = BLOCK_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let base = Utc.ymd(2009, 1, 9).and_hms(0, 0, 0);
    let time = base + Duration::minutes(10 * counter);
    let nonce = nonce.unwrap_or(height as u32);

    let mut header = Vec::with_capacity(80);
    header.extend_from_slice(&1u32.to_le_bytes()); // version
    header.extend_from_slice(&prev_block_hash.0);
    header.extend_from_slice(&Hash::ZERO.0); // merkle_root
    header.extend_from_slice(&(time.timestamp() as u32).to_le_bytes());
    header.extend_from_slice(&0x1d00ffffu32.to_le_bytes()); // bits
    header.extend_from_slice(&nonce.to_le_bytes());
    header.push(0); // num_txs = 0, fits in a single compact-int byte

    Block::new(Bytes::from(header)).expect("hand-built header is always well-formed")
}

/// Builds `num_blocks` blocks chained one after another, starting at
/// `next_height` with parent `prev_block_hash`.
pub fn gen_blocks_from(
    mut next_height: i64,
    mut prev_block_hash: Hash,
    num_blocks: usize,
    nonce: Option<u32>,
) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(num_blocks);
    while blocks.len() < num_blocks {
        let block = make_block(next_height, prev_block_hash, nonce);
        prev_block_hash = block
            .block_hash()
            .expect("hand-built block always hashes cleanly");
        blocks.push(block);
        next_height += 1;
    }
    blocks
}

/// Builds `num_blocks` blocks forming a single linear chain from genesis.
pub fn gen_blocks(num_blocks: usize, nonce: Option<u32>) -> Vec<Block> {
    gen_blocks_from(0, Hash::from_bytes(GENESIS_PREV_HASH), num_blocks, nonce)
}

fn swap(list: &mut [Block], i: usize, j: usize) {
    if i < list.len() && j < list.len() {
        list.swap(i, j);
    }
}

/// Generates a chain of at least `num_blocks` blocks with two repeated
/// fork patterns (a fork, and a fork of that fork) inserted near the tip of
/// every 50-block segment, then shuffles a handful of adjacent pairs to
/// simulate out-of-order arrival.
///
/// Ported from the original `chainscan` test suite's synthetic-chain
/// generator; used to exercise the topological and longest-chain streams'
/// reordering and pruning behaviour end to end.
pub fn gen_artificial_chain_with_forks(num_blocks: usize) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut heights: Vec<i64> = Vec::new();
    let mut next_height = 0i64;
    let mut prev_block_hash = Hash::from_bytes(GENESIS_PREV_HASH);

    while blocks.len() < num_blocks {
        let segment = gen_blocks_from(next_height, prev_block_hash, 50, None);
        for (i, block) in segment.iter().enumerate() {
            heights.push(next_height + i as i64);
        }
        blocks.extend(segment);
        next_height = *heights.last().unwrap() + 1;
        prev_block_hash = blocks
            .last()
            .unwrap()
            .block_hash()
            .expect("hand-built block always hashes cleanly");

        let forked_index1 = blocks.len() - 15;
        let forked_height1 = heights[forked_index1];
        let forked_hash1 = blocks[forked_index1]
            .block_hash()
            .expect("hand-built block always hashes cleanly");
        let fork_blocks1 = gen_blocks_from(forked_height1 + 1, forked_hash1, 5, Some(FORKED_NONCE));

        let forked_block2 = &fork_blocks1[fork_blocks1.len() - 3];
        let forked_height2 = forked_height1 + 1 + (fork_blocks1.len() as i64 - 3);
        let forked_hash2 = forked_block2
            .block_hash()
            .expect("hand-built block always hashes cleanly");
        let fork_blocks2 = gen_blocks_from(forked_height2 + 1, forked_hash2, 2, Some(FORKED_NONCE));

        let fork_len1 = fork_blocks1.len();
        let fork_len2 = fork_blocks2.len();
        let mut fork_blocks = fork_blocks1;
        fork_blocks.extend(fork_blocks2);
        let mut fork_heights = Vec::with_capacity(fork_len1 + fork_len2);
        for i in 0..fork_len1 {
            fork_heights.push(forked_height1 + 1 + i as i64);
        }
        for i in 0..fork_len2 {
            fork_heights.push(forked_height2 + 1 + i as i64);
        }

        let insert_at = blocks.len() - 9;
        for (offset, (block, height)) in fork_blocks.into_iter().zip(fork_heights).enumerate() {
            blocks.insert(insert_at + offset, block);
            heights.insert(insert_at + offset, height);
        }
    }

    swap(&mut blocks, 2, 3);
    swap(&mut blocks, 12, 13);
    swap(&mut blocks, 14, 16);
    for i in 0..4 {
        swap(&mut blocks, 20 + i, 30 + i);
    }
    for i in 0..4 {
        swap(&mut blocks, 88 + i, 98 + i);
    }
    for i in 0..4 {
        swap(&mut blocks, 106 + i, 114 - i);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_blocks_chains_prev_hashes() {
        let blocks = gen_blocks(5, None);
        assert_eq!(blocks.len(), 5);
        assert_eq!(
            blocks[0].prev_block_hash().unwrap(),
            Hash::from_bytes(GENESIS_PREV_HASH)
        );
        for i in 1..blocks.len() {
            assert_eq!(
                blocks[i].prev_block_hash().unwrap(),
                blocks[i - 1].block_hash().unwrap()
            );
        }
    }

    #[test]
    fn gen_artificial_chain_with_forks_produces_requested_minimum() {
        let blocks = gen_artificial_chain_with_forks(200);
        assert!(blocks.len() >= 200);
    }
}

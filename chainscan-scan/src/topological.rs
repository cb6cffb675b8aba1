//! Re-orders stored blocks into a stream where every block is preceded by
//! its parent, buffering blocks whose parent hasn't arrived yet as orphans
//! until that parent (or an ancestor of it) shows up.

use std::collections::HashMap;

use chainscan_chain::{Block, Hash, GENESIS_PREV_HASH};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::stored::StoredBlock;

/// A block paired with the height the topological stream assigned it.
///
/// Height is not a field of `Block` itself — it's derived by this stream
/// from the parent-chase, and carried alongside the block by this wrapper
/// from here on, the same way `StoredBlock` carries a block's `FilePos`.
#[derive(Clone, Debug)]
pub struct ChainBlock {
    pub block: Block,
    pub height: i64,
}

/// Default cap on how many orphaned blocks may accumulate before the
/// stream gives up and reports `ScanError::OrphanOverflow` — a malformed or
/// wildly out-of-order input shouldn't be allowed to grow this without
/// bound.
pub const DEFAULT_MAX_ORPHANS: usize = 100_000;

pub struct TopologicalStream<I> {
    upstream: I,
    height_by_hash: HashMap<Hash, i64>,
    orphans: HashMap<Hash, Vec<Block>>,
    orphan_count: usize,
    max_orphans: usize,
    ready: std::collections::VecDeque<ChainBlock>,
}

impl<I> TopologicalStream<I> {
    pub fn new(upstream: I) -> Self {
        TopologicalStream::with_max_orphans(upstream, DEFAULT_MAX_ORPHANS)
    }

    pub fn with_max_orphans(upstream: I, max_orphans: usize) -> Self {
        let mut height_by_hash = HashMap::new();
        height_by_hash.insert(Hash::from_bytes(GENESIS_PREV_HASH), -1);
        TopologicalStream {
            upstream,
            height_by_hash,
            orphans: HashMap::new(),
            orphan_count: 0,
            max_orphans,
            ready: std::collections::VecDeque::new(),
        }
    }

    fn promote(&mut self, block: Block, height: i64) -> Result<(), ScanError> {
        let mut stack = vec![(block, height)];
        while let Some((block, height)) = stack.pop() {
            let hash = block.block_hash().map_err(|source| ScanError::MalformedBlock {
                hash: None,
                source,
            })?;
            self.height_by_hash.insert(hash, height);
            if let Some(children) = self.orphans.remove(&hash) {
                self.orphan_count -= children.len();
                for child in children {
                    stack.push((child, height + 1));
                }
            }
            self.ready.push_back(ChainBlock { block, height });
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TopologicalStreamState {
        TopologicalStreamState {
            height_by_hash: self.height_by_hash.clone(),
            orphans: self
                .orphans
                .iter()
                .map(|(hash, blocks)| {
                    (
                        *hash,
                        blocks.iter().map(|b| b.raw_bytes().to_vec()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn restore(upstream: I, max_orphans: usize, state: TopologicalStreamState) -> Result<Self, ScanError> {
        let mut orphans = HashMap::new();
        let mut orphan_count = 0;
        for (hash, raw_blocks) in state.orphans {
            let mut blocks = Vec::with_capacity(raw_blocks.len());
            for raw in raw_blocks {
                let block = Block::new(bytes::Bytes::from(raw))
                    .map_err(|source| ScanError::MalformedBlock { hash: Some(hash), source })?;
                blocks.push(block);
            }
            orphan_count += blocks.len();
            orphans.insert(hash, blocks);
        }
        Ok(TopologicalStream {
            upstream,
            height_by_hash: state.height_by_hash,
            orphans,
            orphan_count,
            max_orphans,
            ready: std::collections::VecDeque::new(),
        })
    }
}

impl<I> Iterator for TopologicalStream<I>
where
    I: Iterator<Item = Result<StoredBlock, ScanError>>,
{
    type Item = Result<ChainBlock, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chain_block) = self.ready.pop_front() {
                return Some(Ok(chain_block));
            }
            match self.upstream.next() {
                None => return None,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(stored)) => {
                    let block = stored.block;
                    let prev_hash = match block.prev_block_hash() {
                        Ok(h) => h,
                        Err(source) => {
                            return Some(Err(ScanError::MalformedBlock { hash: None, source }))
                        }
                    };
                    if let Some(&height) = self.height_by_hash.get(&prev_hash) {
                        if let Err(e) = self.promote(block, height + 1) {
                            return Some(Err(e));
                        }
                    } else {
                        if self.orphan_count >= self.max_orphans {
                            return Some(Err(ScanError::OrphanOverflow {
                                bound: self.max_orphans,
                            }));
                        }
                        self.orphans.entry(prev_hash).or_default().push(block);
                        self.orphan_count += 1;
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopologicalStreamState {
    height_by_hash: HashMap<Hash, i64>,
    orphans: HashMap<Hash, Vec<Vec<u8>>>,
}

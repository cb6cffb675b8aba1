use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Block;
use crate::hash::Hash;
use crate::serialization::ParseError;

/// Compact per-block metadata, the unit `BlockChain` stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_hash: Hash,
    pub height: i64,
    pub timestamp: DateTime<Utc>,
    pub num_txs: u64,
    pub rawsize: usize,
}

impl BlockInfo {
    pub fn from_block(block: &Block, height: i64) -> Result<Self, ParseError> {
        Ok(BlockInfo {
            block_hash: block.block_hash()?,
            height,
            timestamp: block.timestamp()?,
            num_txs: block.num_txs()?,
            rawsize: block.rawsize(),
        })
    }
}

#[derive(Error, Debug)]
pub enum BlockChainError {
    #[error("expected block at height {expected}, got height {got}")]
    WrongHeight { expected: i64, got: i64 },
    #[error("block hash already present in chain")]
    DuplicateHash,
}

/// The longest chain only (no forks), as an ordered map from block hash to
/// `BlockInfo` with a secondary height index, matching
/// `original_source/chainscan/blockchain.py`'s `BlockChain`.
#[derive(Default)]
pub struct BlockChain {
    by_hash: HashMap<Hash, BlockInfo>,
    order: Vec<Hash>,
    height_to_hash: HashMap<i64, Hash>,
}

impl BlockChain {
    pub fn new() -> Self {
        BlockChain::default()
    }

    pub fn append(&mut self, info: BlockInfo) -> Result<(), BlockChainError> {
        let expected = self.height() + 1;
        if info.height != expected {
            return Err(BlockChainError::WrongHeight {
                expected,
                got: info.height,
            });
        }
        if self.by_hash.contains_key(&info.block_hash) {
            return Err(BlockChainError::DuplicateHash);
        }
        self.height_to_hash.insert(info.height, info.block_hash);
        self.order.push(info.block_hash);
        self.by_hash.insert(info.block_hash, info);
        Ok(())
    }

    pub fn extend(
        &mut self,
        infos: impl IntoIterator<Item = BlockInfo>,
    ) -> Result<(), BlockChainError> {
        for info in infos {
            self.append(info)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.by_hash.clear();
        self.order.clear();
        self.height_to_hash.clear();
    }

    /// Removes and returns the most recently appended block.
    pub fn pop(&mut self) -> Option<BlockInfo> {
        let hash = self.order.pop()?;
        let info = self.by_hash.remove(&hash)?;
        self.height_to_hash.remove(&info.height);
        Some(info)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockInfo> {
        self.order.iter().map(move |h| &self.by_hash[h])
    }

    pub fn contains_hash(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// -1 when empty, so the next block to append is always `height() + 1`.
    pub fn height(&self) -> i64 {
        self.len() as i64 - 1
    }

    pub fn genesis(&self) -> Option<&BlockInfo> {
        self.get_by_height(0)
    }

    pub fn last_block(&self) -> Option<&BlockInfo> {
        self.order.last().map(|h| &self.by_hash[h])
    }

    pub fn get_by_height(&self, height: i64) -> Option<&BlockInfo> {
        self.height_to_hash.get(&height).and_then(|h| self.by_hash.get(h))
    }

    pub fn get_by_hash(&self, hash: &Hash) -> Option<&BlockInfo> {
        self.by_hash.get(hash)
    }

    /// A plain-data snapshot, for resumability.
    pub fn snapshot(&self) -> BlockChainState {
        BlockChainState {
            entries: self
                .iter()
                .map(|info| {
                    (
                        info.block_hash,
                        info.height,
                        info.timestamp.timestamp(),
                        info.num_txs,
                        info.rawsize,
                    )
                })
                .collect(),
        }
    }

    pub fn restore(state: BlockChainState) -> Result<Self, BlockChainError> {
        let mut chain = BlockChain::new();
        chain.extend(state.entries.into_iter().map(
            |(block_hash, height, timestamp, num_txs, rawsize)| BlockInfo {
                block_hash,
                height,
                timestamp: Utc.timestamp(timestamp, 0),
                num_txs,
                rawsize,
            },
        ))?;
        Ok(chain)
    }
}

/// A plain-data snapshot of `BlockChain`, for resumability.
#[derive(Serialize, Deserialize)]
pub struct BlockChainState {
    entries: Vec<(Hash, i64, i64, u64, usize)>,
}

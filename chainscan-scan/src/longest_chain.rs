//! Resolves forks by holding the full recent fork tree in memory and only
//! emitting a block once every other branch at or below its height has
//! fallen at least `k` blocks behind the tip — i.e. once it's buried deep
//! enough that a reorg could no longer un-emit it.

use std::collections::{HashMap, HashSet};

use chainscan_chain::Hash;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::topological::ChainBlock;

/// Confirmations required before a block is considered final. Mirrors
/// Bitcoin Core's common reorg-safety convention.
pub const DEFAULT_SAFETY_MARGIN: u32 = 6;

/// Default cap on how many blocks the fork tree may hold before the stream
/// gives up with `ScanError::TreeOverflow` — an adversarial or badly
/// misconfigured chain of forks shouldn't be allowed to grow this forever.
pub const DEFAULT_MAX_TREE_SIZE: usize = 100_000;

pub struct LongestChainStream<I> {
    upstream: I,
    safety_margin: i64,
    max_tree_size: usize,
    root_hash: Hash,
    root_height: i64,
    blocks: HashMap<Hash, chainscan_chain::Block>,
    heights: HashMap<Hash, i64>,
    parents: HashMap<Hash, Hash>,
    children: HashMap<Hash, Vec<Hash>>,
    leaves: HashSet<Hash>,
    last_hash: Hash,
}

impl<I> LongestChainStream<I> {
    pub fn new(upstream: I) -> Self {
        LongestChainStream::with_config(upstream, DEFAULT_SAFETY_MARGIN, DEFAULT_MAX_TREE_SIZE)
    }

    pub fn with_config(upstream: I, safety_margin: u32, max_tree_size: usize) -> Self {
        let root_hash = Hash::from_bytes(chainscan_chain::GENESIS_PREV_HASH);
        let mut heights = HashMap::new();
        heights.insert(root_hash, -1);
        let mut children = HashMap::new();
        children.insert(root_hash, Vec::new());
        let mut leaves = HashSet::new();
        leaves.insert(root_hash);
        LongestChainStream {
            upstream,
            safety_margin: safety_margin as i64,
            max_tree_size,
            root_hash,
            root_height: -1,
            blocks: HashMap::new(),
            heights,
            parents: HashMap::new(),
            children,
            leaves,
            last_hash: root_hash,
        }
    }

    fn margin(&self) -> i64 {
        let mut heights: Vec<i64> = self.leaves.iter().map(|h| self.heights[h]).collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        let max_h = heights[0];
        let second = if heights.len() > 1 { heights[1] } else { self.root_height };
        max_h - second
    }

    fn ingest(&mut self, block: chainscan_chain::Block, height: i64) -> Result<(), ScanError> {
        if self.heights.len() - 1 >= self.max_tree_size {
            return Err(ScanError::TreeOverflow {
                bound: self.max_tree_size,
            });
        }
        let hash = block
            .block_hash()
            .map_err(|source| ScanError::MalformedBlock { hash: None, source })?;
        let parent_hash = block
            .prev_block_hash()
            .map_err(|source| ScanError::MalformedBlock { hash: Some(hash), source })?;
        if !self.heights.contains_key(&parent_hash) {
            tracing::debug!(?hash, "dropping block whose parent branch is already pruned");
            return Ok(());
        }
        let parent_height = self.heights[&parent_hash];
        self.leaves.remove(&parent_hash);
        self.heights.insert(hash, height);
        self.parents.insert(hash, parent_hash);
        self.children.entry(parent_hash).or_default().push(hash);
        self.children.entry(hash).or_default();
        self.blocks.insert(hash, block);
        self.leaves.insert(hash);
        self.last_hash = hash;
        let _ = parent_height;
        Ok(())
    }

    fn emit_survivor(&mut self) -> ChainBlock {
        let mut survivor = self.last_hash;
        while self.parents.get(&survivor) != Some(&self.root_hash) {
            survivor = self.parents[&survivor];
        }
        let block = self
            .blocks
            .remove(&survivor)
            .expect("survivor is always a block the tree has seen");
        let height = self.heights[&survivor];

        if let Some(root_children) = self.children.remove(&self.root_hash) {
            for child in root_children {
                if child != survivor {
                    self.prune_subtree(child);
                }
            }
        }

        self.root_hash = survivor;
        self.root_height = height;
        ChainBlock { block, height }
    }

    fn prune_subtree(&mut self, hash: Hash) {
        tracing::debug!(?hash, "pruning losing fork branch");
        self.heights.remove(&hash);
        self.parents.remove(&hash);
        self.blocks.remove(&hash);
        self.leaves.remove(&hash);
        if let Some(children) = self.children.remove(&hash) {
            for child in children {
                self.prune_subtree(child);
            }
        }
    }

    pub fn snapshot(&self) -> LongestChainStreamState {
        LongestChainStreamState {
            safety_margin: self.safety_margin,
            root_hash: self.root_hash,
            root_height: self.root_height,
            blocks: self
                .blocks
                .iter()
                .map(|(h, b)| (*h, b.raw_bytes().to_vec()))
                .collect(),
            heights: self.heights.clone(),
            parents: self.parents.clone(),
            children: self.children.clone(),
            last_hash: self.last_hash,
        }
    }

    pub fn restore(
        upstream: I,
        max_tree_size: usize,
        state: LongestChainStreamState,
    ) -> Result<Self, ScanError> {
        let mut blocks = HashMap::new();
        for (hash, raw) in state.blocks {
            let block = chainscan_chain::Block::new(bytes::Bytes::from(raw))
                .map_err(|source| ScanError::MalformedBlock { hash: Some(hash), source })?;
            blocks.insert(hash, block);
        }
        let leaves = state
            .children
            .iter()
            .filter(|(_, kids)| kids.is_empty())
            .map(|(h, _)| *h)
            .collect();
        Ok(LongestChainStream {
            upstream,
            safety_margin: state.safety_margin,
            max_tree_size,
            root_hash: state.root_hash,
            root_height: state.root_height,
            blocks,
            heights: state.heights,
            parents: state.parents,
            children: state.children,
            leaves,
            last_hash: state.last_hash,
        })
    }
}

impl<I> Iterator for LongestChainStream<I>
where
    I: Iterator<Item = Result<ChainBlock, ScanError>>,
{
    type Item = Result<ChainBlock, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        // `self.blocks.is_empty()` must be checked alongside the margin: on
        // a pristine tree the only leaf is the root sentinel itself, so
        // `margin()` reports 0 and a `safety_margin` of 0 (an explicitly
        // valid configuration) would satisfy the loop condition without a
        // single real block ever having been ingested, and `emit_survivor`
        // has nothing to walk back to.
        while self.blocks.is_empty() || self.margin() < self.safety_margin {
            match self.upstream.next() {
                None => return None,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(ChainBlock { block, height })) => {
                    if let Err(e) = self.ingest(block, height) {
                        return Some(Err(e));
                    }
                }
            }
        }
        Some(Ok(self.emit_survivor()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LongestChainStreamState {
    safety_margin: i64,
    root_hash: Hash,
    root_height: i64,
    blocks: HashMap<Hash, Vec<u8>>,
    heights: HashMap<Hash, i64>,
    parents: HashMap<Hash, Hash>,
    children: HashMap<Hash, Vec<Hash>>,
    last_hash: Hash,
}

//! Builds a `BlockChain` incrementally from the longest-chain stream.

use chainscan_chain::{BlockChain, BlockChainState, BlockInfo};

use crate::error::ScanError;
use crate::topological::ChainBlock;

/// Wraps a longest-chain (or filtered longest-chain) stream, appending each
/// emitted block's `BlockInfo` to an owned `BlockChain` as it passes
/// through, and yielding that same `BlockInfo` to the caller.
pub struct BlockChainIterator<I> {
    upstream: I,
    chain: BlockChain,
}

impl<I> BlockChainIterator<I> {
    pub fn new(upstream: I) -> Self {
        BlockChainIterator {
            upstream,
            chain: BlockChain::new(),
        }
    }

    pub fn chain(&self) -> &BlockChain {
        &self.chain
    }

    pub fn snapshot(&self) -> BlockChainState {
        self.chain.snapshot()
    }

    pub fn restore(upstream: I, state: BlockChainState) -> Result<Self, ScanError> {
        Ok(BlockChainIterator {
            upstream,
            chain: BlockChain::restore(state)?,
        })
    }
}

impl<I> Iterator for BlockChainIterator<I>
where
    I: Iterator<Item = Result<ChainBlock, ScanError>>,
{
    type Item = Result<BlockInfo, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.upstream.next()? {
            Err(e) => Some(Err(e)),
            Ok(ChainBlock { block, height }) => {
                let info = match BlockInfo::from_block(&block, height) {
                    Ok(info) => info,
                    Err(source) => return Some(Err(ScanError::MalformedBlock { hash: None, source })),
                };
                if let Err(e) = self.chain.append(info.clone()) {
                    return Some(Err(e.into()));
                }
                Some(Ok(info))
            }
        }
    }
}

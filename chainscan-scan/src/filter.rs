//! Post-emission filtering by height, timestamp, or block hash bounds.

use chainscan_chain::Hash;
use chrono::{DateTime, Utc};

use crate::error::ScanError;
use crate::topological::ChainBlock;

/// Start/stop bounds applied to an already-ordered block stream.
///
/// Ordered fields (height, timestamp) use inclusive-start/exclusive-stop
/// range semantics. The unordered field (hash) waits for an exact match to
/// start, and ends the stream on an exact match to stop (also exclusive:
/// the stop block itself is not emitted).
///
/// Timestamps are approximate and not strictly monotone across blocks —
/// this filter treats them as ordered anyway, inheriting the same
/// imprecision the original tool documents rather than fixing it.
#[derive(Clone, Debug, Default)]
pub struct BlockFilterConfig {
    pub start_block_height: Option<i64>,
    pub stop_block_height: Option<i64>,
    pub start_block_time: Option<DateTime<Utc>>,
    pub stop_block_time: Option<DateTime<Utc>>,
    pub start_block_hash: Option<Hash>,
    pub stop_block_hash: Option<Hash>,
}

/// Tracks whether the start bound has been crossed yet and whether the stop
/// bound has ended the stream, so that hash-based bounds (which aren't
/// re-checkable after the fact) only need a single pass.
struct WorkingBlockFilter {
    config: BlockFilterConfig,
    is_started: bool,
    is_ended: bool,
}

impl WorkingBlockFilter {
    fn new(config: BlockFilterConfig) -> Self {
        let is_started = config.start_block_height.is_none()
            && config.start_block_time.is_none()
            && config.start_block_hash.is_none();
        WorkingBlockFilter {
            config,
            is_started,
            is_ended: false,
        }
    }

    /// Returns `Some(true)` to emit, `Some(false)` to skip and keep going,
    /// `None` to end the stream (this block and all following are excluded).
    fn admit(&mut self, block: &chainscan_chain::Block, height: i64) -> Result<Option<bool>, ScanError> {
        if self.is_ended {
            return Ok(None);
        }

        if !self.is_started {
            let past_height = self.config.start_block_height.map_or(true, |h| height >= h);
            let past_time = match self.config.start_block_time {
                Some(t) => {
                    let ts = block
                        .timestamp()
                        .map_err(|source| ScanError::MalformedBlock { hash: None, source })?;
                    ts >= t
                }
                None => true,
            };
            let past_hash = match self.config.start_block_hash {
                Some(h) => {
                    let hash = block
                        .block_hash()
                        .map_err(|source| ScanError::MalformedBlock { hash: None, source })?;
                    hash == h
                }
                None => true,
            };
            if past_height && past_time && past_hash {
                self.is_started = true;
            } else {
                return Ok(Some(false));
            }
        }

        if let Some(stop_height) = self.config.stop_block_height {
            if height >= stop_height {
                self.is_ended = true;
                return Ok(None);
            }
        }
        if let Some(stop_time) = self.config.stop_block_time {
            let ts = block
                .timestamp()
                .map_err(|source| ScanError::MalformedBlock { hash: None, source })?;
            if ts >= stop_time {
                self.is_ended = true;
                return Ok(None);
            }
        }
        if let Some(stop_hash) = self.config.stop_block_hash {
            let hash = block
                .block_hash()
                .map_err(|source| ScanError::MalformedBlock { hash: None, source })?;
            if hash == stop_hash {
                self.is_ended = true;
                return Ok(None);
            }
        }

        Ok(Some(true))
    }
}

/// Applies a `BlockFilterConfig` to any stream of `ChainBlock`s.
pub struct BlockFilter<I> {
    upstream: I,
    working: WorkingBlockFilter,
}

impl<I> BlockFilter<I> {
    pub fn new(upstream: I, config: BlockFilterConfig) -> Self {
        BlockFilter {
            upstream,
            working: WorkingBlockFilter::new(config),
        }
    }
}

impl<I> Iterator for BlockFilter<I>
where
    I: Iterator<Item = Result<ChainBlock, ScanError>>,
{
    type Item = Result<ChainBlock, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.upstream.next()?;
            let chain_block = match item {
                Ok(b) => b,
                Err(e) => return Some(Err(e)),
            };
            match self.working.admit(&chain_block.block, chain_block.height) {
                Ok(Some(true)) => return Some(Ok(chain_block)),
                Ok(Some(false)) => continue,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

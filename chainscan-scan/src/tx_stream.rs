//! Flattens a stream of chained blocks into their individual transactions.

use std::sync::Arc;

use bytes::Bytes;
use chainscan_chain::{Block, Transaction};

use crate::error::ScanError;
use crate::topological::ChainBlock;

/// A transaction together with the block it was found in and its index
/// within that block.
///
/// Holds `Arc<Block>` rather than a borrow: tx streams are composed behind
/// `dyn Iterator` further up the pipeline (`chainscan-cli`), where a
/// borrowed lifetime wouldn't compose with the rest of the chain.
///
/// `block`/`index` are only populated when `include_block_context` is set
/// on the producing `TxStream`; `blob` only when `include_tx_blob` is.
/// `height` is always present — it's the tx's confirmation height, tracked
/// by the stream regardless of whether the block back-reference itself is
/// attached.
#[derive(Clone, Debug)]
pub struct TxInBlock {
    pub tx: Transaction,
    pub block: Option<Arc<Block>>,
    pub height: i64,
    pub index: Option<u64>,
    pub blob: Option<Bytes>,
}

/// Which optional fields `TxStream` attaches to each emitted `TxInBlock`.
#[derive(Clone, Copy, Debug)]
pub struct TxStreamConfig {
    pub include_block_context: bool,
    pub include_tx_blob: bool,
}

impl Default for TxStreamConfig {
    fn default() -> Self {
        TxStreamConfig {
            include_block_context: true,
            include_tx_blob: false,
        }
    }
}

/// Flattens each incoming block into its transactions, parsing lazily: the
/// leading `num_txs` varint is read once per block, then each transaction
/// is parsed and sliced off in turn as the consumer asks for it.
pub struct TxStream<I> {
    upstream: I,
    config: TxStreamConfig,
    current: Option<(Arc<Block>, i64, chainscan_chain::BlockTxs, u64)>,
}

impl<I> TxStream<I> {
    pub fn new(upstream: I) -> Self {
        TxStream::with_config(upstream, TxStreamConfig::default())
    }

    pub fn with_config(upstream: I, config: TxStreamConfig) -> Self {
        TxStream {
            upstream,
            config,
            current: None,
        }
    }
}

impl<I> Iterator for TxStream<I>
where
    I: Iterator<Item = Result<ChainBlock, ScanError>>,
{
    type Item = Result<TxInBlock, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((block, height, txs, index)) = &mut self.current {
                match txs.next() {
                    Some(Ok(tx)) => {
                        let blob = if self.config.include_tx_blob {
                            Some(tx.raw_bytes().clone())
                        } else {
                            None
                        };
                        let result = TxInBlock {
                            tx,
                            block: if self.config.include_block_context {
                                Some(block.clone())
                            } else {
                                None
                            },
                            height: *height,
                            index: if self.config.include_block_context {
                                Some(*index)
                            } else {
                                None
                            },
                            blob,
                        };
                        *index += 1;
                        return Some(Ok(result));
                    }
                    Some(Err(source)) => {
                        let hash = block.block_hash().ok();
                        self.current = None;
                        return Some(Err(ScanError::MalformedTx {
                            block_hash: hash.unwrap_or(chainscan_chain::Hash::ZERO),
                            source,
                        }));
                    }
                    None => {
                        self.current = None;
                    }
                }
            }

            match self.upstream.next() {
                None => return None,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(ChainBlock { block, height })) => {
                    let txs = match block.txs() {
                        Ok(txs) => txs,
                        Err(source) => {
                            let hash = block.block_hash().unwrap_or(chainscan_chain::Hash::ZERO);
                            return Some(Err(ScanError::MalformedBlock {
                                hash: Some(hash),
                                source,
                            }));
                        }
                    };
                    self.current = Some((Arc::new(block), height, txs, 0));
                }
            }
        }
    }
}

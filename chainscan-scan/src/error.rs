use std::path::PathBuf;

use chainscan_chain::{BlockChainError, Hash, ParseError};
use chainscan_io::SourceError;
use thiserror::Error;

/// Failures a block stream can hit once bytes leave `chainscan-io` and start
/// being interpreted as blocks, transactions and chain structure.
///
/// End-of-data and filter-rejection are not represented here: the former is
/// `None` from the relevant iterator, the latter is silently skipped by the
/// filtering adapter — neither is a failure, both are normal control flow.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("malformed frame in {filename:?} at offset {offset}: {source}")]
    MalformedFrame {
        filename: PathBuf,
        offset: u64,
        #[source]
        source: ParseError,
    },

    #[error("malformed block ({hash:?}): {source}")]
    MalformedBlock {
        hash: Option<Hash>,
        #[source]
        source: ParseError,
    },

    #[error("malformed transaction in block {block_hash}: {source}")]
    MalformedTx {
        block_hash: Hash,
        #[source]
        source: ParseError,
    },

    #[error("orphan pool exceeded its {bound}-block bound without finding a parent")]
    OrphanOverflow { bound: usize },

    #[error("block chain error: {0}")]
    Chain(#[from] BlockChainError),

    #[error("longest-chain tree exceeded its {bound}-block bound")]
    TreeOverflow { bound: usize },
}

//! Binary parsing and the zero-copy data model for raw Bitcoin blocks and
//! transactions: varints, block/transaction framing, hashing, and the
//! longest-chain metadata record (`BlockChain`).

pub mod block;
pub mod blockchain;
pub mod cached;
pub mod compactint;
pub mod framing;
pub mod hash;
pub mod header;
pub mod serialization;
pub mod sha256d;
pub mod transaction;

pub use block::{Block, BlockTxs};
pub use blockchain::{BlockChain, BlockChainError, BlockChainState, BlockInfo};
pub use cached::Cached;
pub use compactint::CompactInt;
pub use framing::{
    split_block, tx_len, SplitBlock, COINBASE_SENTINEL, DEFAULT_TXID_PREFIX_LEN,
    GENESIS_PREV_HASH, HEADER_LEN, MAGIC, SATOSHIS_PER_COIN,
};
pub use hash::Hash;
pub use header::Header;
pub use serialization::{BtcDecode, BtcEncode, ParseError};
pub use transaction::{Transaction, TxInput, TxOutput};

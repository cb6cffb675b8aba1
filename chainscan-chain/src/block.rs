use bytes::Bytes;

use crate::compactint::CompactInt;
use crate::framing::{self, HEADER_LEN};
use crate::hash::Hash;
use crate::header::Header;
use crate::serialization::ParseError;
use crate::transaction::Transaction;

/// A block, as a lazy view over its raw bytes (header + tx blob).
///
/// No field is eagerly materialised beyond the bytes themselves: every
/// accessor re-derives its value from `blob` on each call. This mirrors the
/// Python `chainscan` package's `Block`, which exposes all of these as
/// simple byte-slice properties over a stored blob, rather than the more
/// usual approach of eagerly parsing into an owned tree of objects.
#[derive(Clone, Debug)]
pub struct Block {
    blob: Bytes,
}

impl Block {
    /// Wraps a block payload (as returned by `framing::split_block`) without
    /// copying or validating its contents beyond the header length check.
    pub fn new(blob: Bytes) -> Result<Self, ParseError> {
        if blob.len() < HEADER_LEN {
            return Err(ParseError::UnexpectedEof {
                needed: HEADER_LEN,
                available: blob.len(),
            });
        }
        Ok(Block { blob })
    }

    /// The block's raw bytes, exactly as read from disk. Returning this
    /// slice directly is what satisfies the round-trip property: there is
    /// nothing to re-serialize because nothing was ever parsed away.
    pub fn raw_bytes(&self) -> &Bytes {
        &self.blob
    }

    pub fn header(&self) -> Result<Header, ParseError> {
        Header::parse(self.blob.slice(0..HEADER_LEN))
    }

    pub fn block_hash(&self) -> Result<Hash, ParseError> {
        Ok(self.header()?.block_hash())
    }

    pub fn prev_block_hash(&self) -> Result<Hash, ParseError> {
        Ok(self.header()?.previous_block_hash)
    }

    pub fn timestamp(&self) -> Result<chrono::DateTime<chrono::Utc>, ParseError> {
        Ok(self.header()?.time)
    }

    fn tx_blob(&self) -> Bytes {
        self.blob.slice(HEADER_LEN..)
    }

    pub fn num_txs(&self) -> Result<u64, ParseError> {
        let (count, _) = CompactInt::parse(&self.tx_blob())?;
        Ok(count)
    }

    pub fn rawsize(&self) -> usize {
        self.blob.len()
    }

    /// A lazy iterator over this block's transactions.
    pub fn txs(&self) -> Result<BlockTxs, ParseError> {
        let tx_blob = self.tx_blob();
        let (num_txs, consumed) = CompactInt::parse(&tx_blob)?;
        Ok(BlockTxs {
            remaining: tx_blob.slice(consumed..),
            num_txs,
            index: 0,
        })
    }
}

/// Lazily parses each transaction's length and slices it off the block's tx
/// blob, one at a time; `Transaction` objects themselves are built lazily
/// on top of these slices (see `transaction::Transaction`).
pub struct BlockTxs {
    remaining: Bytes,
    num_txs: u64,
    index: u64,
}

impl Iterator for BlockTxs {
    type Item = Result<Transaction, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_txs {
            if !self.remaining.is_empty() {
                // The block claimed fewer transactions than its blob holds,
                // or a prior `tx_len` under-reported — either way the
                // containing block is malformed.
                return Some(Err(ParseError::InvalidValue(
                    "tx blob has leftover bytes after num_txs transactions",
                )));
            }
            return None;
        }
        let len = match framing::tx_len(&self.remaining) {
            Ok(len) => len,
            Err(e) => {
                self.index = self.num_txs; // stop on next call
                return Some(Err(e));
            }
        };
        let tx_bytes = self.remaining.slice(0..len);
        self.remaining = self.remaining.slice(len..);
        self.index += 1;
        Some(Ok(Transaction::new(tx_bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        let mut buf = Vec::with_capacity(80);
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&1_231_006_505u32.to_le_bytes());
        buf.extend_from_slice(&0x1d00ffffu32.to_le_bytes());
        buf.extend_from_slice(&2083236893u32.to_le_bytes());
        buf
    }

    #[test]
    fn no_txs_block_round_trips_and_reports_zero_txs() {
        let mut blob = header_bytes();
        blob.push(0); // num_txs = 0
        let block = Block::new(Bytes::from(blob.clone())).unwrap();
        assert_eq!(block.raw_bytes().as_ref(), blob.as_slice());
        assert_eq!(block.num_txs().unwrap(), 0);
        assert!(block.txs().unwrap().next().is_none());
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(Block::new(Bytes::from(vec![0u8; 10])).is_err());
    }
}

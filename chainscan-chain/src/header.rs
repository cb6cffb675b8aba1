use std::io::{Cursor, Write};

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::cached::Cached;
use crate::framing::HEADER_LEN;
use crate::hash::Hash;
use crate::sha256d;
use crate::serialization::{BtcDecode, ParseError};

/// An 80-byte block header.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub version: u32,
    pub previous_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: DateTime<Utc>,
    pub bits: u32,
    pub nonce: u32,
    hash: Cached<Hash>,
}

impl Header {
    pub const LEN: usize = HEADER_LEN;

    /// Parses a header from exactly `HEADER_LEN` bytes, computing its
    /// block hash over the raw bytes before touching individual fields —
    /// this avoids re-serializing the header just to hash it.
    pub fn parse(raw: Bytes) -> Result<Self, ParseError> {
        if raw.len() != HEADER_LEN {
            return Err(ParseError::UnexpectedEof {
                needed: HEADER_LEN,
                available: raw.len(),
            });
        }
        let mut hash_writer = sha256d::Writer::default();
        hash_writer
            .write_all(&raw)
            .expect("sha256d::Writer is infallible");
        let hash = Hash::from_bytes(hash_writer.finish());

        let mut cursor = Cursor::new(raw);
        Ok(Header {
            version: u32::btc_decode(&mut cursor)?,
            previous_block_hash: Hash::btc_decode(&mut cursor)?,
            merkle_root: Hash::btc_decode(&mut cursor)?,
            time: <DateTime<Utc>>::btc_decode(&mut cursor)?,
            bits: u32::btc_decode(&mut cursor)?,
            nonce: u32::btc_decode(&mut cursor)?,
            hash: Cached::from(hash),
        })
    }

    /// The header's block hash, computed during `parse`.
    pub fn block_hash(&self) -> Hash {
        self.hash.value().expect("hash is always populated by parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes(nonce: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(80);
        buf.extend_from_slice(&1u32.to_le_bytes()); // version
        buf.extend_from_slice(&[0u8; 32]); // prev hash
        buf.extend_from_slice(&[0u8; 32]); // merkle root
        buf.extend_from_slice(&1_231_006_505u32.to_le_bytes()); // time
        buf.extend_from_slice(&0x1d00ffffu32.to_le_bytes()); // bits
        buf.extend_from_slice(&nonce.to_le_bytes());
        buf
    }

    #[test]
    fn parse_rejects_short_input() {
        let err = Header::parse(Bytes::from(vec![0u8; 79]));
        assert!(err.is_err());
    }

    #[test]
    fn same_bytes_hash_identically() {
        let bytes = sample_header_bytes(2083236893);
        let h1 = Header::parse(Bytes::from(bytes.clone())).unwrap();
        let h2 = Header::parse(Bytes::from(bytes)).unwrap();
        assert_eq!(h1.block_hash(), h2.block_hash());
    }

    #[test]
    fn different_nonce_changes_hash() {
        let h1 = Header::parse(Bytes::from(sample_header_bytes(1))).unwrap();
        let h2 = Header::parse(Bytes::from(sample_header_bytes(2))).unwrap();
        assert_ne!(h1.block_hash(), h2.block_hash());
    }
}

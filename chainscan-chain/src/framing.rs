//! The on-disk framing format and the constants it's built from.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::compactint::CompactInt;
use crate::serialization::ParseError;

/// Network magic bytes that prefix every on-disk frame.
pub const MAGIC: [u8; 4] = [0xF9, 0xBE, 0xB4, 0xD9];

/// `magic(4) + payload_size(4)`.
pub const FRAME_PREFIX_LEN: usize = 8;

/// The previous-block-hash value genesis points to.
pub const GENESIS_PREV_HASH: [u8; 32] = [0u8; 32];

/// Sentinel `spent_output_idx` that marks a coinbase input.
pub const COINBASE_SENTINEL: u32 = 0xFFFF_FFFF;

/// 10^8 satoshis per coin.
pub const SATOSHIS_PER_COIN: u64 = 100_000_000;

/// Default number of leading txid bytes used as a UTXO key.
pub const DEFAULT_TXID_PREFIX_LEN: usize = 8;

/// Length, in bytes, of a serialized block header.
pub const HEADER_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitBlock {
    /// A complete frame was found; `payload` is the block's raw bytes
    /// (header + tx count + transactions), not including the magic/size
    /// prefix. `consumed` is `FRAME_PREFIX_LEN + payload.len()`.
    Frame { payload: Bytes, consumed: usize },
    /// `buf` is too short to hold a frame, or begins with all-zero magic:
    /// both mark the end of written data in this buffer.
    EndOfData,
}

/// Splits one framed block off the front of `buf`. Does not allocate or
/// copy: `payload` is a ref-counted slice of `buf`.
pub fn split_block(buf: &Bytes) -> Result<SplitBlock, ParseError> {
    if buf.len() < FRAME_PREFIX_LEN {
        return Ok(SplitBlock::EndOfData);
    }
    let magic = &buf[0..4];
    if magic.iter().all(|&b| b == 0) {
        return Ok(SplitBlock::EndOfData);
    }
    if magic != MAGIC {
        return Err(ParseError::InvalidValue("bad frame magic bytes"));
    }
    let payload_size = LittleEndian::read_u32(&buf[4..8]) as usize;
    let total = FRAME_PREFIX_LEN + payload_size;
    if buf.len() < total {
        // Frame header is present but the payload hasn't been fully written
        // yet (or the file is truncated mid-block): treat as end-of-data,
        // matching the tailable path's expectation that a retry later will
        // see the completed frame.
        return Ok(SplitBlock::EndOfData);
    }
    Ok(SplitBlock::Frame {
        payload: buf.slice(FRAME_PREFIX_LEN..total),
        consumed: total,
    })
}

/// Walks one transaction's structure without materialising any
/// `TxInput`/`TxOutput` objects, returning only the number of bytes it
/// occupies. Used to slice successive transactions out of a block's tx
/// blob; `Transaction::inputs()`/`outputs()` do the actual (lazy) object
/// construction once a caller asks for them.
pub fn tx_len(buf: &[u8]) -> Result<usize, ParseError> {
    let mut offset = 4usize; // version
    need(buf, offset)?;

    let (num_inputs, consumed) = CompactInt::parse(&buf[offset..])?;
    offset += consumed;
    for _ in 0..num_inputs {
        need(buf, offset + 36)?;
        offset += 36; // prev txid + vout
        let (script_len, consumed) = CompactInt::parse(&buf[offset..])?;
        offset += consumed;
        need(buf, offset + script_len as usize + 4)?;
        offset += script_len as usize + 4; // script + sequence
    }

    let (num_outputs, consumed) = CompactInt::parse(&buf[offset..])?;
    offset += consumed;
    for _ in 0..num_outputs {
        need(buf, offset + 8)?;
        offset += 8; // value
        let (script_len, consumed) = CompactInt::parse(&buf[offset..])?;
        offset += consumed;
        need(buf, offset + script_len as usize)?;
        offset += script_len as usize;
    }

    need(buf, offset + 4)?;
    offset += 4; // locktime

    Ok(offset)
}

fn need(buf: &[u8], len: usize) -> Result<(), ParseError> {
    if buf.len() < len {
        Err(ParseError::UnexpectedEof {
            needed: len,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

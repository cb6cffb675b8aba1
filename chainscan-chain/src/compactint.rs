//! Bitcoin's variable-length integer encoding ("varint" / "CompactSize").
//!
//! Encoding: values below 0xFD serialize as a single byte; 0xFD introduces a
//! 2-byte LE value, 0xFE a 4-byte LE value, 0xFF an 8-byte LE value.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Read, Write};

use crate::serialization::{BtcDecode, BtcEncode, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactInt(u64);

impl CompactInt {
    pub fn new(value: u64) -> CompactInt {
        CompactInt(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Number of bytes `value` would occupy once encoded.
    pub fn size(value: u64) -> usize {
        if value < 253 {
            1
        } else if value <= u16::MAX as u64 {
            3
        } else if value <= u32::MAX as u64 {
            5
        } else {
            9
        }
    }

    /// Parses a varint directly out of a byte slice, reporting the exact
    /// number of bytes consumed. Used by callers (the block/tx splitters)
    /// that need to advance a cursor without going through an `io::Read`.
    pub fn parse(buf: &[u8]) -> Result<(u64, usize), ParseError> {
        let first = *buf
            .first()
            .ok_or(ParseError::UnexpectedEof { needed: 1, available: 0 })?;
        match first {
            0..=252 => Ok((first as u64, 1)),
            253 => {
                if buf.len() < 3 {
                    return Err(ParseError::UnexpectedEof { needed: 3, available: buf.len() });
                }
                Ok((LittleEndian::read_u16(&buf[1..3]) as u64, 3))
            }
            254 => {
                if buf.len() < 5 {
                    return Err(ParseError::UnexpectedEof { needed: 5, available: buf.len() });
                }
                Ok((LittleEndian::read_u32(&buf[1..5]) as u64, 5))
            }
            255 => {
                if buf.len() < 9 {
                    return Err(ParseError::UnexpectedEof { needed: 9, available: buf.len() });
                }
                Ok((LittleEndian::read_u64(&buf[1..9]), 9))
            }
        }
    }
}

impl BtcEncode for CompactInt {
    fn btc_encode<W: Write>(&self, mut target: W) -> std::io::Result<()> {
        if self.0 < 253 {
            target.write_all(&[self.0 as u8])
        } else if self.0 <= u16::MAX as u64 {
            target.write_all(&[253])?;
            target.write_u16::<LittleEndian>(self.0 as u16)
        } else if self.0 <= u32::MAX as u64 {
            target.write_all(&[254])?;
            target.write_u32::<LittleEndian>(self.0 as u32)
        } else {
            target.write_all(&[255])?;
            target.write_u64::<LittleEndian>(self.0)
        }
    }
}

impl BtcDecode for CompactInt {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        let first = u8::btc_decode(&mut target)?;
        let value = match first {
            0..=252 => first as u64,
            253 => u16::btc_decode(&mut target)? as u64,
            254 => u32::btc_decode(&mut target)? as u64,
            255 => u64::btc_decode(&mut target)?,
        };
        Ok(CompactInt(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_boundaries() {
        assert_eq!(CompactInt::size(0), 1);
        assert_eq!(CompactInt::size(252), 1);
        assert_eq!(CompactInt::size(253), 3);
        assert_eq!(CompactInt::size(u16::MAX as u64), 3);
        assert_eq!(CompactInt::size(u16::MAX as u64 + 1), 5);
        assert_eq!(CompactInt::size(u32::MAX as u64), 5);
        assert_eq!(CompactInt::size(u32::MAX as u64 + 1), 9);
    }

    #[test]
    fn parse_matches_encode() {
        for value in [0u64, 1, 252, 253, 300, 70_000, 5_000_000_000] {
            let bytes = CompactInt::new(value).btc_encode_to_vec().unwrap();
            let (parsed, consumed) = CompactInt::parse(&bytes).unwrap();
            assert_eq!(parsed, value);
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn parse_reports_truncated_prefix() {
        assert!(CompactInt::parse(&[253, 0]).is_err());
        assert!(CompactInt::parse(&[]).is_err());
    }
}

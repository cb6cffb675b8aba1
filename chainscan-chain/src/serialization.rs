//! Fixed-width binary (de)serialization for header-level fields.
//!
//! Variable-length, count-prefixed structures (transactions, scripts) are
//! not expressed through these traits — see `framing` and `transaction`,
//! which walk the wire format directly so that `consumed` byte counts are
//! reported exactly, per the binary parser's contract.

use std::convert::TryFrom;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

pub use chainscan_serde_derive::{BtcDeserialize, BtcSerialize};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected end of input: needed {needed} bytes, had {available}")]
    UnexpectedEof { needed: usize, available: usize },
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub trait BtcEncode {
    fn btc_encode<W: Write>(&self, target: W) -> io::Result<()>;

    fn btc_encode_to_vec(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.btc_encode(&mut out)?;
        Ok(out)
    }
}

pub trait BtcDecode: Sized {
    fn btc_decode<R: Read>(target: R) -> Result<Self, ParseError>;
}

impl BtcEncode for bool {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_all(&[*self as u8])
    }
}
impl BtcDecode for bool {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        Ok(target.read_u8()? != 0)
    }
}

impl BtcEncode for u8 {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_all(&[*self])
    }
}
impl BtcDecode for u8 {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        Ok(target.read_u8()?)
    }
}

impl BtcEncode for u16 {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_u16::<LittleEndian>(*self)
    }
}
impl BtcDecode for u16 {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        Ok(target.read_u16::<LittleEndian>()?)
    }
}

impl BtcEncode for u32 {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_u32::<LittleEndian>(*self)
    }
}
impl BtcDecode for u32 {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        Ok(target.read_u32::<LittleEndian>()?)
    }
}

impl BtcEncode for u64 {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_u64::<LittleEndian>(*self)
    }
}
impl BtcDecode for u64 {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        Ok(target.read_u64::<LittleEndian>()?)
    }
}

/// Bitcoin block/tx timestamps are Unix epoch seconds encoded as `u32` LE.
impl BtcEncode for DateTime<Utc> {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        let secs = u32::try_from(self.timestamp()).unwrap_or(u32::MAX);
        target.write_u32::<LittleEndian>(secs)
    }
}
impl BtcDecode for DateTime<Utc> {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        let secs = target.read_u32::<LittleEndian>()?;
        Ok(Utc.timestamp(secs as i64, 0))
    }
}

impl BtcEncode for [u8; 4] {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_all(self)
    }
}
impl BtcDecode for [u8; 4] {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        let mut buf = [0u8; 4];
        target.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl BtcEncode for [u8; 32] {
    fn btc_encode<W: Write>(&self, mut target: W) -> io::Result<()> {
        target.write_all(self)
    }
}
impl BtcDecode for [u8; 32] {
    fn btc_decode<R: Read>(mut target: R) -> Result<Self, ParseError> {
        let mut buf = [0u8; 32];
        target.read_exact(&mut buf)?;
        Ok(buf)
    }
}

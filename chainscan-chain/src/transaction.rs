use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::compactint::CompactInt;
use crate::framing::COINBASE_SENTINEL;
use crate::hash::Hash;
use crate::sha256d;
use crate::serialization::ParseError;

/// A transaction input.
///
/// Coinbase inputs are detected after parsing, not tagged on the wire: the
/// first input of a transaction is reinterpreted as `Coinbase` if its
/// `spent_output_idx` is the sentinel `0xFFFFFFFF`. This mirrors the
/// original parser's `parse_tx`, which parses all inputs uniformly and only
/// then special-cases input zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxInput {
    Spending {
        spent_txid: Hash,
        spent_output_idx: u32,
        script: Bytes,
        sequence: u32,
    },
    Coinbase {
        script: Bytes,
        sequence: u32,
    },
}

impl TxInput {
    pub fn is_coinbase(&self) -> bool {
        matches!(self, TxInput::Coinbase { .. })
    }

    pub fn script(&self) -> &Bytes {
        match self {
            TxInput::Spending { script, .. } => script,
            TxInput::Coinbase { script, .. } => script,
        }
    }

    pub fn sequence(&self) -> u32 {
        match self {
            TxInput::Spending { sequence, .. } => *sequence,
            TxInput::Coinbase { sequence, .. } => *sequence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script: Bytes,
}

/// A transaction, as a lazy view over its raw bytes. `blob` is expected to
/// hold exactly this transaction's bytes (no trailing data) — callers
/// (`Block::txs`) slice it to that exact length using `framing::tx_len`
/// before constructing a `Transaction`.
#[derive(Clone, Debug)]
pub struct Transaction {
    blob: Bytes,
}

struct Decomposed {
    version: u32,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    locktime: u32,
}

impl Transaction {
    pub fn new(blob: Bytes) -> Self {
        Transaction { blob }
    }

    pub fn raw_bytes(&self) -> &Bytes {
        &self.blob
    }

    pub fn rawsize(&self) -> usize {
        self.blob.len()
    }

    pub fn txid(&self) -> Hash {
        Hash::from_bytes(sha256d::sha256d(&self.blob))
    }

    pub fn version(&self) -> Result<u32, ParseError> {
        Ok(self.decompose()?.version)
    }

    pub fn locktime(&self) -> Result<u32, ParseError> {
        Ok(self.decompose()?.locktime)
    }

    pub fn inputs(&self) -> Result<Vec<TxInput>, ParseError> {
        Ok(self.decompose()?.inputs)
    }

    pub fn outputs(&self) -> Result<Vec<TxOutput>, ParseError> {
        Ok(self.decompose()?.outputs)
    }

    pub fn is_coinbase(&self) -> Result<bool, ParseError> {
        let inputs = self.inputs()?;
        Ok(inputs.len() == 1 && inputs[0].is_coinbase())
    }

    fn decompose(&self) -> Result<Decomposed, ParseError> {
        let buf = &self.blob[..];
        need(buf, 4)?;
        let version = LittleEndian::read_u32(&buf[0..4]);
        let mut offset = 4;

        let (num_inputs, consumed) = CompactInt::parse(&buf[offset..])?;
        offset += consumed;
        let mut inputs = Vec::with_capacity(num_inputs as usize);
        for _ in 0..num_inputs {
            need(buf, offset + 36)?;
            let spent_txid = Hash::from_bytes(slice32(&buf[offset..offset + 32]));
            let spent_output_idx = LittleEndian::read_u32(&buf[offset + 32..offset + 36]);
            offset += 36;
            let (script_len, consumed) = CompactInt::parse(&buf[offset..])?;
            offset += consumed;
            need(buf, offset + script_len as usize + 4)?;
            let script = self.blob.slice(offset..offset + script_len as usize);
            offset += script_len as usize;
            let sequence = LittleEndian::read_u32(&buf[offset..offset + 4]);
            offset += 4;
            inputs.push(TxInput::Spending {
                spent_txid,
                spent_output_idx,
                script,
                sequence,
            });
        }

        // Coinbase detection after parsing: replace input zero if it carries
        // the sentinel spent-output index.
        if let Some(TxInput::Spending {
            spent_output_idx,
            script,
            sequence,
            ..
        }) = inputs.first().cloned()
        {
            if spent_output_idx == COINBASE_SENTINEL {
                inputs[0] = TxInput::Coinbase { script, sequence };
            }
        }

        let (num_outputs, consumed) = CompactInt::parse(&buf[offset..])?;
        offset += consumed;
        let mut outputs = Vec::with_capacity(num_outputs as usize);
        for _ in 0..num_outputs {
            need(buf, offset + 8)?;
            let value = LittleEndian::read_u64(&buf[offset..offset + 8]);
            offset += 8;
            let (script_len, consumed) = CompactInt::parse(&buf[offset..])?;
            offset += consumed;
            need(buf, offset + script_len as usize)?;
            let script = self.blob.slice(offset..offset + script_len as usize);
            offset += script_len as usize;
            outputs.push(TxOutput { value, script });
        }

        need(buf, offset + 4)?;
        let locktime = LittleEndian::read_u32(&buf[offset..offset + 4]);

        Ok(Decomposed {
            version,
            inputs,
            outputs,
            locktime,
        })
    }
}

fn slice32(s: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(s);
    out
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

#[cfg(test)]
mod tests {
    use super::*;

    fn coinbase_tx_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes()); // version
        buf.push(1); // num_inputs
        buf.extend_from_slice(&[0u8; 32]); // spent_txid (ignored)
        buf.extend_from_slice(&COINBASE_SENTINEL.to_le_bytes()); // spent_output_idx
        buf.push(4); // script_len
        buf.extend_from_slice(&[1, 2, 3, 4]); // script
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
        buf.push(1); // num_outputs
        buf.extend_from_slice(&(50 * 100_000_000u64).to_le_bytes()); // value
        buf.push(0); // script_len
        buf.extend_from_slice(&0u32.to_le_bytes()); // locktime
        buf
    }

    #[test]
    fn coinbase_input_is_detected_after_parse() {
        let tx = Transaction::new(Bytes::from(coinbase_tx_bytes()));
        let inputs = tx.inputs().unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].is_coinbase());
        assert!(tx.is_coinbase().unwrap());
        let outputs = tx.outputs().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].value, 50 * 100_000_000);
    }

    #[test]
    fn rawsize_equals_blob_len() {
        let bytes = coinbase_tx_bytes();
        let tx = Transaction::new(Bytes::from(bytes.clone()));
        assert_eq!(tx.rawsize(), bytes.len());
    }
}

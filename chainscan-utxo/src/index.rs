//! The in-memory UTXO index: `(txid, vout) -> OutputInfo`.
//!
//! Memory is the dominant concern here — a live index holds the entire
//! unspent set, which for Bitcoin's real chain is millions of entries. Two
//! knobs trade memory for safety: the txid key can be truncated to an
//! 8-byte prefix (uniqueness empirically holds, but is no longer considered
//! fully safe against collisions) or kept as the full 32 bytes; and output
//! scripts can be dropped entirely if a caller only needs values.

use std::collections::HashMap;

use chainscan_chain::Hash;
use serde::{Deserialize, Serialize};

/// How much of a txid to use as part of the index's key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxidKeyLen {
    /// The default the original tool ships with. Documented as no longer
    /// fully collision-safe; kept as an explicit, equally-supported choice
    /// rather than a silent default so callers have to decide.
    Prefix8,
    Full32,
}

#[derive(Clone, Debug)]
pub struct UtxoConfig {
    pub txid_key_len: TxidKeyLen,
    pub include_scripts: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutPointKey {
    Prefix8([u8; 8], u32),
    Full32([u8; 32], u32),
}

impl OutPointKey {
    fn new(config: &UtxoConfig, txid: &Hash, vout: u32) -> Self {
        match config.txid_key_len {
            TxidKeyLen::Prefix8 => {
                let mut prefix = [0u8; 8];
                prefix.copy_from_slice(&txid.0[..8]);
                OutPointKey::Prefix8(prefix, vout)
            }
            TxidKeyLen::Full32 => OutPointKey::Full32(txid.0, vout),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputInfo {
    pub value: u64,
    pub block_height: i64,
    pub script: Option<bytes::Bytes>,
}

/// The live UTXO set, keyed by `(txid, vout)`.
pub struct UtxoIndex {
    config: UtxoConfig,
    entries: HashMap<OutPointKey, OutputInfo>,
}

impl UtxoIndex {
    pub fn new(config: UtxoConfig) -> Self {
        UtxoIndex {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &UtxoConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a newly created output. A duplicate `(txid, vout)` (some
    /// early coinbase transactions are not unique) overwrites the previous
    /// entry, logging a warning rather than failing: this mirrors Bitcoin
    /// Core's own historical tolerance for those specific duplicates.
    pub fn insert(&mut self, txid: &Hash, vout: u32, info: OutputInfo) {
        let key = OutPointKey::new(&self.config, txid, vout);
        if self.entries.insert(key, info).is_some() {
            tracing::warn!(%txid, vout, "duplicate UTXO insertion, overwriting");
        }
    }

    /// Removes and returns the output spent by `(txid, vout)`, if present.
    pub fn remove(&mut self, txid: &Hash, vout: u32) -> Option<OutputInfo> {
        let key = OutPointKey::new(&self.config, txid, vout);
        self.entries.remove(&key)
    }

    pub fn snapshot(&self) -> UtxoIndexState {
        UtxoIndexState {
            txid_key_len: self.config.txid_key_len,
            include_scripts: self.config.include_scripts,
            entries: self.entries.clone().into_iter().collect(),
        }
    }

    pub fn restore(state: UtxoIndexState) -> Self {
        UtxoIndex {
            config: UtxoConfig {
                txid_key_len: state.txid_key_len,
                include_scripts: state.include_scripts,
            },
            entries: state.entries.into_iter().collect(),
        }
    }
}

/// A plain-data snapshot of `UtxoIndex`, for resumability. Unlike the
/// original tool (whose UTXO set is documented as not supporting pickling),
/// nothing here prevents serialising it: the config and entries are both
/// plain data.
#[derive(Serialize, Deserialize)]
pub struct UtxoIndexState {
    txid_key_len: TxidKeyLen,
    include_scripts: bool,
    entries: Vec<(OutPointKey, OutputInfo)>,
}

//! Resolves each transaction's inputs against the live UTXO set and updates
//! it with the transaction's own outputs — both as a bare function callers
//! can drive themselves, and as an iterator adapter over a tx stream.

use chainscan_chain::{Transaction, TxInput};
use chainscan_scan::TxInBlock;

use crate::error::{TrackError, UtxoError};
use crate::index::{OutputInfo, UtxoIndex};

/// A transaction's inputs, each paired with the `OutputInfo` it spent
/// (`None` for the coinbase input).
pub struct TrackedTx {
    pub tx_in_block: TxInBlock,
    pub spent: Vec<Option<OutputInfo>>,
}

/// The bare spending tracker: given a transaction and the height it's
/// confirmed at, resolves its inputs against the index and then inserts
/// its outputs. Usable standalone, without any particular stream type.
pub struct SpendingTracker {
    index: UtxoIndex,
}

impl SpendingTracker {
    pub fn new(index: UtxoIndex) -> Self {
        SpendingTracker { index }
    }

    pub fn index(&self) -> &UtxoIndex {
        &self.index
    }

    pub fn into_index(self) -> UtxoIndex {
        self.index
    }

    /// Resolves every input of `tx` against the index, then inserts `tx`'s
    /// own outputs at `height`. Returns one resolved `OutputInfo` per
    /// input, in input order (`None` for the coinbase input).
    pub fn process_tx(
        &mut self,
        tx: &Transaction,
        height: i64,
    ) -> Result<Vec<Option<OutputInfo>>, UtxoError> {
        let txid = tx.txid();
        let inputs = tx
            .inputs()
            .map_err(|source| UtxoError::MalformedTx { txid, source })?;

        let mut spent = Vec::new();
        for input in &inputs {
            match input {
                TxInput::Coinbase { .. } => spent.push(None),
                TxInput::Spending {
                    spent_txid,
                    spent_output_idx,
                    ..
                } => {
                    let info = self.index.remove(spent_txid, *spent_output_idx).ok_or(
                        UtxoError::UnknownOutput {
                            txid: *spent_txid,
                            vout: *spent_output_idx,
                        },
                    )?;
                    spent.push(Some(info));
                }
            }
        }

        let outputs = tx
            .outputs()
            .map_err(|source| UtxoError::MalformedTx { txid, source })?;
        let include_scripts = self.index.config().include_scripts;
        for (i, output) in outputs.iter().enumerate() {
            self.index.insert(
                &txid,
                i as u32,
                OutputInfo {
                    value: output.value,
                    block_height: height,
                    script: if include_scripts {
                        Some(output.script.clone())
                    } else {
                        None
                    },
                },
            );
        }

        Ok(spent)
    }
}

/// Wraps a `chainscan-scan` tx stream, running every transaction through a
/// `SpendingTracker` as it passes, and yielding each one annotated with
/// what it spent.
pub struct TrackedSpendingTxIterator<I> {
    upstream: I,
    tracker: SpendingTracker,
}

impl<I> TrackedSpendingTxIterator<I> {
    pub fn new(upstream: I, tracker: SpendingTracker) -> Self {
        TrackedSpendingTxIterator { upstream, tracker }
    }

    pub fn into_tracker(self) -> SpendingTracker {
        self.tracker
    }
}

impl<I> Iterator for TrackedSpendingTxIterator<I>
where
    I: Iterator<Item = Result<TxInBlock, chainscan_scan::ScanError>>,
{
    type Item = Result<TrackedTx, TrackError>;

    fn next(&mut self) -> Option<Self::Item> {
        let tx_in_block = match self.upstream.next()? {
            Ok(t) => t,
            Err(e) => return Some(Err(e.into())),
        };
        match self.tracker.process_tx(&tx_in_block.tx, tx_in_block.height) {
            Ok(spent) => Some(Ok(TrackedTx { tx_in_block, spent })),
            Err(e) => Some(Err(e.into())),
        }
    }
}

//! The UTXO index and the spending tracker built on top of it: resolves
//! each transaction's inputs against previously seen outputs, then records
//! the transaction's own outputs as newly live.

pub mod error;
pub mod index;
pub mod tracker;

pub use error::{TrackError, UtxoError};
pub use index::{OutPointKey, OutputInfo, TxidKeyLen, UtxoConfig, UtxoIndex, UtxoIndexState};
pub use tracker::{SpendingTracker, TrackedSpendingTxIterator, TrackedTx};

#[cfg(test)]
mod tests {
    use super::*;
    use chainscan_chain::Hash;

    fn txid(byte: u8) -> Hash {
        Hash([byte; 32])
    }

    #[test]
    fn insert_then_remove_round_trips() {
        let mut index = UtxoIndex::new(UtxoConfig {
            txid_key_len: TxidKeyLen::Full32,
            include_scripts: false,
        });
        index.insert(
            &txid(1),
            0,
            OutputInfo {
                value: 5_000_000_000,
                block_height: 0,
                script: None,
            },
        );
        assert_eq!(index.len(), 1);
        let removed = index.remove(&txid(1), 0).unwrap();
        assert_eq!(removed.value, 5_000_000_000);
        assert!(index.is_empty());
    }

    #[test]
    fn remove_unknown_output_returns_none() {
        let mut index = UtxoIndex::new(UtxoConfig {
            txid_key_len: TxidKeyLen::Prefix8,
            include_scripts: false,
        });
        assert!(index.remove(&txid(9), 0).is_none());
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut index = UtxoIndex::new(UtxoConfig {
            txid_key_len: TxidKeyLen::Prefix8,
            include_scripts: true,
        });
        index.insert(
            &txid(2),
            1,
            OutputInfo {
                value: 42,
                block_height: 7,
                script: Some(bytes::Bytes::from_static(b"\x00")),
            },
        );
        let restored = UtxoIndex::restore(index.snapshot());
        assert_eq!(restored.len(), 1);
    }

    fn coinbase_tx(value: u64) -> chainscan_chain::Transaction {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes()); // version
        buf.push(1); // num_inputs
        buf.extend_from_slice(&[0u8; 32]); // spent_txid (ignored)
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // spent_output_idx
        buf.push(0); // script_len
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
        buf.push(1); // num_outputs
        buf.extend_from_slice(&value.to_le_bytes());
        buf.push(0); // script_len
        buf.extend_from_slice(&0u32.to_le_bytes()); // locktime
        chainscan_chain::Transaction::new(bytes::Bytes::from(buf))
    }

    fn spending_tx(spent_txid: Hash, spent_vout: u32, out_values: &[u64]) -> chainscan_chain::Transaction {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.push(1); // num_inputs
        buf.extend_from_slice(&spent_txid.0);
        buf.extend_from_slice(&spent_vout.to_le_bytes());
        buf.push(0); // script_len
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
        buf.push(out_values.len() as u8); // num_outputs
        for value in out_values {
            buf.extend_from_slice(&value.to_le_bytes());
            buf.push(0); // script_len
        }
        buf.extend_from_slice(&0u32.to_le_bytes());
        chainscan_chain::Transaction::new(bytes::Bytes::from(buf))
    }

    fn tx_in_block(
        tx: chainscan_chain::Transaction,
        block: &std::sync::Arc<chainscan_chain::Block>,
        height: i64,
        index: u64,
    ) -> chainscan_scan::TxInBlock {
        chainscan_scan::TxInBlock {
            tx,
            block: Some(block.clone()),
            height,
            index: Some(index),
            blob: None,
        }
    }

    /// Scenario S4: a coinbase tx T0 followed by a tx T1 spending
    /// `(T0.txid, 0)` and producing two new outputs. After both, the index
    /// holds `(T1.txid, 0)` and `(T1.txid, 1)` but not `(T0.txid, 0)`, and
    /// T1's input carries T0's output.
    #[test]
    fn tracked_spending_tx_iterator_follows_s4() {
        let block = std::sync::Arc::new(chainscan_test::artificial::make_block(
            0,
            Hash::ZERO,
            None,
        ));
        let t0 = coinbase_tx(50 * 100_000_000);
        let t0_txid = t0.txid();
        let t1 = spending_tx(t0_txid, 0, &[10, 20]);
        let t1_txid = t1.txid();

        let stream: Vec<Result<chainscan_scan::TxInBlock, chainscan_scan::ScanError>> = vec![
            Ok(tx_in_block(t0, &block, 0, 0)),
            Ok(tx_in_block(t1, &block, 1, 0)),
        ];
        let stream = stream.into_iter();

        let index = UtxoIndex::new(UtxoConfig {
            txid_key_len: TxidKeyLen::Full32,
            include_scripts: false,
        });
        let tracker = SpendingTracker::new(index);
        let mut tracked = TrackedSpendingTxIterator::new(stream, tracker);

        let t0_tracked = tracked.next().unwrap().unwrap();
        assert_eq!(t0_tracked.spent.len(), 1);
        assert!(t0_tracked.spent[0].is_none());

        let t1_tracked = tracked.next().unwrap().unwrap();
        assert_eq!(t1_tracked.spent.len(), 1);
        let spent_output = t1_tracked.spent[0].as_ref().unwrap();
        assert_eq!(spent_output.value, 50 * 100_000_000);

        assert!(tracked.next().is_none());

        let mut index = tracked.into_tracker().into_index();
        assert!(index.remove(&t0_txid, 0).is_none());
        assert_eq!(index.remove(&t1_txid, 0).unwrap().value, 10);
        assert_eq!(index.remove(&t1_txid, 1).unwrap().value, 20);
    }
}

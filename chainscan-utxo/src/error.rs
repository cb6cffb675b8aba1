use chainscan_chain::{Hash, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UtxoError {
    #[error("unknown output spent: txid {txid} vout {vout}")]
    UnknownOutput { txid: Hash, vout: u32 },
    #[error("malformed transaction {txid}: {source}")]
    MalformedTx {
        txid: Hash,
        #[source]
        source: ParseError,
    },
}

/// Errors from `TrackedSpendingTxIterator`, which sits downstream of a
/// `chainscan-scan` tx stream and can fail either because the upstream
/// stream failed, or because tracking itself hit an inconsistency.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Scan(#[from] chainscan_scan::ScanError),
    #[error(transparent)]
    Utxo(#[from] UtxoError),
}

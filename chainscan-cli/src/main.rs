//! A thin demonstration binary wiring the scanning pipeline together:
//! `RawFileSource -> StoredBlockStream -> TopologicalStream ->
//! LongestChainStream -> [BlockFilter] -> TxStream -> [TrackedSpendingTxIterator]`.
//!
//! Command-line parsing, progress rendering, and script-address decoding
//! are all out of scope for the library this binary wires up; this is
//! intentionally the only place those concerns show up at all.

use std::path::PathBuf;

use chainscan_chain::Hash;
use chainscan_io::{FileSourceConfig, RawFileSource};
use chainscan_scan::{
    BlockFilter, BlockFilterConfig, LongestChainStream, StoredBlockStream, TopologicalStream,
    TxStream,
};
use chainscan_utxo::{SpendingTracker, TrackedSpendingTxIterator, TxidKeyLen, UtxoConfig, UtxoIndex};
use color_eyre::eyre::Result;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "chainscan-cli",
    about = "Scans raw blk*.dat files and prints summary statistics for the longest chain."
)]
struct Options {
    /// Directory containing blk*.dat files.
    #[structopt(long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    /// Glob pattern (relative to data-dir) matching block files.
    #[structopt(long, default_value = "blk*.dat")]
    glob_pattern: String,

    /// Number of confirmations a branch must lead every sibling by before
    /// it's accepted as part of the longest chain.
    #[structopt(long, default_value = "6")]
    safety_margin: u32,

    /// Rescan the data directory for new files once known ones are exhausted.
    #[structopt(long)]
    refresh: bool,

    /// Use mmap rather than a full read for each block file.
    #[structopt(long)]
    use_mmap: bool,

    /// Inclusive lower height bound to emit.
    #[structopt(long)]
    start_block_height: Option<i64>,

    /// Exclusive upper height bound; stream ends when reached.
    #[structopt(long)]
    stop_block_height: Option<i64>,

    /// Inclusive lower block-hash bound (reversed hex, as displayed).
    #[structopt(long)]
    start_block_hash: Option<Hash>,

    /// Exclusive upper block-hash bound; stream ends on exact match.
    #[structopt(long)]
    stop_block_hash: Option<Hash>,

    /// Track UTXO spending and print aggregate input/output totals.
    #[structopt(long)]
    track_spending: bool,

    /// Use the full 32-byte txid as the UTXO key instead of an 8-byte
    /// prefix. Slower and larger, but collision-free.
    #[structopt(long)]
    full_txid_key: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let options = Options::from_args();

    let source_config = FileSourceConfig {
        data_dir: options
            .data_dir
            .clone()
            .unwrap_or_else(|| FileSourceConfig::default().data_dir),
        glob_pattern: options.glob_pattern.clone(),
        use_mmap: options.use_mmap,
        refresh: options.refresh,
    };
    let source = RawFileSource::new(source_config)?;

    let stored = StoredBlockStream::new(source, options.refresh);
    let topological = TopologicalStream::new(stored);
    let longest_chain = LongestChainStream::with_config(
        topological,
        options.safety_margin,
        chainscan_scan::DEFAULT_MAX_TREE_SIZE,
    );
    let filtered = BlockFilter::new(
        longest_chain,
        BlockFilterConfig {
            start_block_height: options.start_block_height,
            stop_block_height: options.stop_block_height,
            start_block_hash: options.start_block_hash,
            stop_block_hash: options.stop_block_hash,
            ..Default::default()
        },
    );
    let txs = TxStream::new(filtered);

    let mut blocks_seen: u64 = 0;
    let mut txs_seen: u64 = 0;
    let mut last_height: i64 = -1;

    if options.track_spending {
        let index = UtxoIndex::new(UtxoConfig {
            txid_key_len: if options.full_txid_key {
                TxidKeyLen::Full32
            } else {
                TxidKeyLen::Prefix8
            },
            include_scripts: false,
        });
        let tracker = SpendingTracker::new(index);
        let tracked = TrackedSpendingTxIterator::new(txs, tracker);

        let mut total_value_in: u128 = 0;
        let mut total_value_out: u128 = 0;
        for item in tracked {
            let tracked_tx = item?;
            if tracked_tx.tx_in_block.height != last_height {
                last_height = tracked_tx.tx_in_block.height;
                blocks_seen += 1;
            }
            txs_seen += 1;
            for spent in &tracked_tx.spent {
                if let Some(output) = spent {
                    total_value_in += output.value as u128;
                }
            }
            for output in tracked_tx.tx_in_block.tx.outputs()? {
                total_value_out += output.value as u128;
            }
        }
        println!(
            "blocks={} txs={} height={} total_value_in={} total_value_out={}",
            blocks_seen, txs_seen, last_height, total_value_in, total_value_out
        );
    } else {
        for item in txs {
            let tx_in_block = item?;
            if tx_in_block.height != last_height {
                last_height = tx_in_block.height;
                blocks_seen += 1;
            }
            txs_seen += 1;
        }
        println!("blocks={} txs={} height={}", blocks_seen, txs_seen, last_height);
    }

    Ok(())
}

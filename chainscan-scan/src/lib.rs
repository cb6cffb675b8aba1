//! The scanning pipeline: raw per-file buffers become framed blocks, framed
//! blocks become a topologically ordered stream, orphans and forks resolve
//! into a single longest chain, and blocks flatten into transactions.
//!
//! Each stage is an `Iterator` adapter over the previous one, composed by
//! the caller (see `chainscan-cli`) rather than by a built-in pipeline
//! type — the pull-driven, single-threaded model described by the scanning
//! component's concurrency section falls out naturally from `Iterator`
//! composition and needs no extra machinery.

pub mod blockchain;
pub mod error;
pub mod filter;
pub mod longest_chain;
pub mod resume;
pub mod stored;
pub mod tailable;
pub mod topological;
pub mod tx_stream;

pub use blockchain::BlockChainIterator;
pub use error::ScanError;
pub use filter::{BlockFilter, BlockFilterConfig};
pub use longest_chain::{LongestChainStream, LongestChainStreamState, DEFAULT_MAX_TREE_SIZE, DEFAULT_SAFETY_MARGIN};
pub use stored::{StoredBlock, StoredBlockStream, StoredBlockStreamState};
pub use tailable::{StopHandle, Tailable, TailableConfig};
pub use topological::{ChainBlock, TopologicalStream, TopologicalStreamState, DEFAULT_MAX_ORPHANS};
pub use tx_stream::{TxInBlock, TxStream, TxStreamConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use chainscan_test::artificial::{gen_artificial_chain_with_forks, gen_blocks, FORKED_NONCE};

    fn pipeline(
        blocks: Vec<chainscan_chain::Block>,
    ) -> impl Iterator<Item = Result<ChainBlock, ScanError>> {
        let stored = blocks.into_iter().map(|block| {
            Ok(StoredBlock {
                block,
                filepos: chainscan_io::FilePos {
                    filename: "blk00000.dat".into(),
                    offset: 0,
                },
            })
        });
        TopologicalStream::new(stored)
    }

    #[test]
    fn topological_stream_reorders_and_assigns_heights() {
        let blocks = gen_blocks(5, None);
        let mut shuffled = blocks.clone();
        shuffled.reverse();
        let mut stream = pipeline(shuffled);
        let mut heights = Vec::new();
        while let Some(item) = stream.next() {
            heights.push(item.unwrap().height);
        }
        assert_eq!(heights, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn longest_chain_stream_waits_for_safety_margin() {
        let blocks = gen_blocks(10, None);
        let topo = pipeline(blocks);
        let mut longest = LongestChainStream::with_config(topo, 3, DEFAULT_MAX_TREE_SIZE);
        let mut emitted = Vec::new();
        while let Some(item) = longest.next() {
            emitted.push(item.unwrap().height);
        }
        // With a 10-block chain and a safety margin of 3, the last two
        // blocks never accumulate enough confirmations to be emitted.
        assert_eq!(emitted, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn height_filter_bounds_emission() {
        let blocks = gen_blocks(20, None);
        let topo = pipeline(blocks);
        let longest = LongestChainStream::with_config(topo, 1, DEFAULT_MAX_TREE_SIZE);
        let filtered = BlockFilter::new(
            longest,
            BlockFilterConfig {
                start_block_height: Some(5),
                stop_block_height: Some(10),
                ..Default::default()
            },
        );
        let heights: Vec<i64> = filtered.map(|r| r.unwrap().height).collect();
        assert_eq!(heights, (5..10).collect::<Vec<_>>());
    }

    /// Exercises S2/S3: a chain with a genuine fork (and a fork-of-a-fork)
    /// plus out-of-order arrival. The losing branches' blocks (tagged with
    /// `FORKED_NONCE`) must never reach the safety-margin threshold needed
    /// to be emitted, and the emitted chain must advance height-by-height
    /// with no gaps or repeats.
    #[test]
    fn longest_chain_stream_prunes_losing_fork_branches() {
        let blocks = gen_artificial_chain_with_forks(200);
        let topo = pipeline(blocks);
        let mut longest =
            LongestChainStream::with_config(topo, DEFAULT_SAFETY_MARGIN, DEFAULT_MAX_TREE_SIZE);

        let mut emitted_heights = Vec::new();
        while let Some(item) = longest.next() {
            let chain_block = item.unwrap();
            let nonce = chain_block.block.header().unwrap().nonce;
            assert_ne!(
                nonce, FORKED_NONCE,
                "a losing fork branch block was emitted as part of the longest chain"
            );
            emitted_heights.push(chain_block.height);
        }

        for pair in emitted_heights.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "emitted heights must be contiguous");
        }
        assert!(
            emitted_heights.len() > 150,
            "expected most of the 200-block chain to clear the safety margin, got {}",
            emitted_heights.len()
        );
    }
}

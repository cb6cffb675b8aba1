//! Conventions shared by this crate's resumable streams.
//!
//! Every stage in the pipeline (`StoredBlockStream`, `TopologicalStream`,
//! `LongestChainStream`, `BlockChainIterator`) follows the same shape: an
//! inherent `snapshot(&self) -> XxxState` method producing a plain,
//! `serde`-serialisable record, and an associated `restore`/`resume`
//! constructor taking that state back plus whatever the stage's upstream
//! needs reconstructed first (since each stage's state only covers what it
//! owns, not its upstream's).
//!
//! There is deliberately no shared `Resumable` trait: each stage's
//! `restore` needs a different set of extra arguments (an upstream
//! iterator, a `FileSourceConfig`, a bound), which a single trait method
//! signature can't express without either an associated-type explosion or
//! a config enum nobody would want to construct. The convention is
//! documentation, not a type.

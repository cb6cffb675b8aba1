//! Turns raw per-file byte buffers into individually framed blocks.

use chainscan_chain::{split_block, Block, SplitBlock};
use chainscan_io::{FilePos, RawFileSource, RawFileSourceState};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// A block together with where it was found on disk.
#[derive(Clone, Debug)]
pub struct StoredBlock {
    pub block: Block,
    pub filepos: FilePos,
}

/// Splits successive frames off the files yielded by a `RawFileSource`,
/// wrapping each payload as a `Block` and tagging it with its `FilePos`.
///
/// When a file's trailing bytes don't form a complete frame (short tail, or
/// zeroed-out padding), and the source is configured to refresh, the stream
/// re-reads that same file once to pick up bytes that may have been
/// appended since — the behaviour a tailing reader needs while a node is
/// still writing `blk*.dat`. If the re-read grows no further, the stream
/// ends: it never skips ahead to the next file out of turn.
pub struct StoredBlockStream {
    source: RawFileSource,
    refresh: bool,
    current_path: Option<std::path::PathBuf>,
    buffer: bytes::Bytes,
    offset: usize,
}

impl StoredBlockStream {
    pub fn new(source: RawFileSource, refresh: bool) -> Self {
        StoredBlockStream {
            source,
            refresh,
            current_path: None,
            buffer: bytes::Bytes::new(),
            offset: 0,
        }
    }

    fn pull_next_file(&mut self) -> Result<bool, ScanError> {
        match self.source.next_buffer()? {
            Some((path, buf)) => {
                self.current_path = Some(path);
                self.buffer = buf;
                self.offset = 0;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn snapshot(&self) -> StoredBlockStreamState {
        StoredBlockStreamState {
            source: self.source.snapshot(),
            current_path: self.current_path.clone(),
            offset: self.offset as u64,
        }
    }

    pub fn resume(
        source_config: chainscan_io::FileSourceConfig,
        refresh: bool,
        state: StoredBlockStreamState,
    ) -> Result<Self, ScanError> {
        let source = RawFileSource::resume(source_config, state.source)?;
        let mut stream = StoredBlockStream::new(source, refresh);
        if let Some(path) = state.current_path {
            let buffer = stream.source.reread(&path)?;
            stream.current_path = Some(path);
            stream.buffer = buffer;
            stream.offset = state.offset as usize;
        }
        Ok(stream)
    }
}

impl Iterator for StoredBlockStream {
    type Item = Result<StoredBlock, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_path.is_none() || self.offset >= self.buffer.len() {
                match self.pull_next_file() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                }
            }

            let remaining = self.buffer.slice(self.offset..);
            match split_block(&remaining) {
                Ok(SplitBlock::Frame { payload, consumed }) => {
                    let filepos = FilePos {
                        filename: self.current_path.clone().unwrap(),
                        offset: self.offset as u64,
                    };
                    self.offset += consumed;
                    return match Block::new(payload) {
                        Ok(block) => Some(Ok(StoredBlock { block, filepos })),
                        Err(source) => Some(Err(ScanError::MalformedFrame {
                            filename: filepos.filename,
                            offset: filepos.offset,
                            source,
                        })),
                    };
                }
                Ok(SplitBlock::EndOfData) => {
                    if self.refresh {
                        let path = self.current_path.clone().unwrap();
                        match self.source.reread(&path) {
                            Ok(reread) if reread.len() > self.buffer.len() => {
                                self.buffer = reread;
                                continue;
                            }
                            Ok(_) => return None,
                            Err(e) => return Some(Err(e.into())),
                        }
                    }
                    return None;
                }
                Err(source) => {
                    let filepos = FilePos {
                        filename: self.current_path.clone().unwrap(),
                        offset: self.offset as u64,
                    };
                    return Some(Err(ScanError::MalformedFrame {
                        filename: filepos.filename,
                        offset: filepos.offset,
                        source,
                    }));
                }
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredBlockStreamState {
    source: RawFileSourceState,
    current_path: Option<std::path::PathBuf>,
    offset: u64,
}

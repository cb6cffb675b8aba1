use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::FileSourceConfig;
use crate::error::SourceError;

/// A block's position within a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePos {
    pub filename: PathBuf,
    pub offset: u64,
}

struct MmapBuf(memmap2::Mmap);

impl AsRef<[u8]> for MmapBuf {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Enumerates `blk*.dat`-style files in a directory, in lexicographic
/// (= creation) order, yielding each file's entire contents as a cheaply
/// sliceable `Bytes` buffer.
///
/// Two re-entry behaviours, per the binary-parser component's contract:
/// `refresh` rescans the directory once the known file list is exhausted,
/// picking up files whose name sorts after the last one yielded; `reread`
/// re-reads an already-yielded file to pick up bytes appended to its tail
/// (used by the tailable adapter).
pub struct RawFileSource {
    config: FileSourceConfig,
    files: Vec<PathBuf>,
    next_index: usize,
}

impl RawFileSource {
    pub fn new(config: FileSourceConfig) -> Result<Self, SourceError> {
        let mut source = RawFileSource {
            config,
            files: Vec::new(),
            next_index: 0,
        };
        source.rescan()?;
        Ok(source)
    }

    fn rescan(&mut self) -> Result<(), SourceError> {
        let pattern = self
            .config
            .data_dir
            .join(&self.config.glob_pattern)
            .to_string_lossy()
            .into_owned();
        let mut found: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|source| SourceError::Pattern {
                pattern: pattern.clone(),
                source,
            })?
            .filter_map(Result::ok)
            .collect();
        found.sort();
        if found.len() > self.files.len() {
            tracing::info!(new_files = found.len() - self.files.len(), "raw file source rescanned");
        }
        self.files = found;
        Ok(())
    }

    /// Pulls the next file's full buffer, rescanning the directory first if
    /// `refresh` is enabled and the known file list is exhausted. Returns
    /// `None` once there is truly nothing left to read.
    pub fn next_buffer(&mut self) -> Result<Option<(PathBuf, Bytes)>, SourceError> {
        if self.next_index >= self.files.len() && self.config.refresh {
            self.rescan()?;
        }
        if self.next_index >= self.files.len() {
            return Ok(None);
        }
        let path = self.files[self.next_index].clone();
        self.next_index += 1;
        let bytes = self.read_file(&path)?;
        Ok(Some((path, bytes)))
    }

    /// Re-reads a previously yielded file, to pick up bytes appended since
    /// it was last read.
    pub fn reread(&self, path: &Path) -> Result<Bytes, SourceError> {
        self.read_file(path)
    }

    fn read_file(&self, path: &Path) -> Result<Bytes, SourceError> {
        if self.config.use_mmap {
            let file = File::open(path).map_err(|source| SourceError::Read {
                path: path.to_owned(),
                source,
            })?;
            // Safety: the file is treated as read-only input that this
            // process never writes to concurrently with the mapping.
            let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| SourceError::Read {
                path: path.to_owned(),
                source,
            })?;
            Ok(Bytes::from_owner(MmapBuf(mmap)))
        } else {
            let data = std::fs::read(path).map_err(|source| SourceError::Read {
                path: path.to_owned(),
                source,
            })?;
            Ok(Bytes::from(data))
        }
    }

    /// A plain-data snapshot sufficient to resume scanning: the filename of
    /// the last yielded file and how many files are already known. The
    /// caller re-derives `next_index` by rescanning, matching design note
    /// §9's "re-acquire by filename, not by re-serialising megabytes".
    pub fn snapshot(&self) -> RawFileSourceState {
        RawFileSourceState {
            last_yielded: self.files.get(self.next_index.wrapping_sub(1)).cloned(),
        }
    }

    pub fn resume(
        config: FileSourceConfig,
        state: RawFileSourceState,
    ) -> Result<Self, SourceError> {
        let mut source = RawFileSource::new(config)?;
        if let Some(last) = state.last_yielded {
            source.next_index = source
                .files
                .iter()
                .position(|f| *f == last)
                .map(|i| i + 1)
                .unwrap_or(0);
        }
        Ok(source)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawFileSourceState {
    last_yielded: Option<PathBuf>,
}

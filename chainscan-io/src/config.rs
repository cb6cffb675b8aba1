use std::path::PathBuf;

/// Configuration for `RawFileSource`.
#[derive(Clone, Debug)]
pub struct FileSourceConfig {
    /// Directory to scan for block files.
    pub data_dir: PathBuf,
    /// Glob pattern (relative to `data_dir`) matching block files.
    pub glob_pattern: String,
    /// Hint: use `mmap` rather than a full read for each file.
    pub use_mmap: bool,
    /// When the directory listing is exhausted, rescan for new files.
    pub refresh: bool,
}

impl Default for FileSourceConfig {
    fn default() -> Self {
        FileSourceConfig {
            data_dir: default_data_dir(),
            glob_pattern: "blk*.dat".to_owned(),
            use_mmap: false,
            refresh: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".bitcoin").join("blocks")
}

//! Enumerates on-disk block files and yields their contents as cheaply
//! sliceable byte buffers. Does not interpret file contents.

pub mod config;
pub mod error;
pub mod source;

pub use config::FileSourceConfig;
pub use error::SourceError;
pub use source::{FilePos, RawFileSource, RawFileSourceState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lists_files_in_lexicographic_order_and_reads_contents() {
        let dir = tempdir::TempDir::new("chainscan-io-test").unwrap();
        for (name, contents) in [("blk00001.dat", b"bbb" as &[u8]), ("blk00000.dat", b"aaa")] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(contents).unwrap();
        }

        let config = FileSourceConfig {
            data_dir: dir.path().to_owned(),
            ..FileSourceConfig::default()
        };
        let mut source = RawFileSource::new(config).unwrap();

        let (path0, buf0) = source.next_buffer().unwrap().unwrap();
        assert!(path0.ends_with("blk00000.dat"));
        assert_eq!(&buf0[..], b"aaa");

        let (path1, buf1) = source.next_buffer().unwrap().unwrap();
        assert!(path1.ends_with("blk00001.dat"));
        assert_eq!(&buf1[..], b"bbb");

        assert!(source.next_buffer().unwrap().is_none());
    }

    #[test]
    fn refresh_picks_up_new_files() {
        let dir = tempdir::TempDir::new("chainscan-io-test-refresh").unwrap();
        std::fs::write(dir.path().join("blk00000.dat"), b"aaa").unwrap();

        let config = FileSourceConfig {
            data_dir: dir.path().to_owned(),
            ..FileSourceConfig::default()
        };
        let mut source = RawFileSource::new(config).unwrap();
        assert!(source.next_buffer().unwrap().is_some());
        assert!(source.next_buffer().unwrap().is_none());

        std::fs::write(dir.path().join("blk00001.dat"), b"bbb").unwrap();
        let (path, buf) = source.next_buffer().unwrap().unwrap();
        assert!(path.ends_with("blk00001.dat"));
        assert_eq!(&buf[..], b"bbb");
    }

    #[test]
    fn reread_picks_up_appended_bytes() {
        let dir = tempdir::TempDir::new("chainscan-io-test-reread").unwrap();
        let path = dir.path().join("blk00000.dat");
        std::fs::write(&path, b"aaa").unwrap();

        let config = FileSourceConfig {
            data_dir: dir.path().to_owned(),
            ..FileSourceConfig::default()
        };
        let source = RawFileSource::new(config).unwrap();

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"bbb").unwrap();

        let reread = source.reread(&path).unwrap();
        assert_eq!(&reread[..], b"aaabbb");
    }
}

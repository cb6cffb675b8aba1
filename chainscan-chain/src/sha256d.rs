//! Double-SHA-256, used for block hashes and txids.

use std::io;

use sha2::{Digest, Sha256};

/// An `io::Write` sink that accumulates bytes for a single SHA-256 pass;
/// `finish()` performs the second pass over the first digest.
pub struct Writer(Sha256);

impl Default for Writer {
    fn default() -> Self {
        Writer(Sha256::new())
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Writer {
    pub fn finish(self) -> [u8; 32] {
        let first = self.0.finalize();
        let second = Sha256::digest(&first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        out
    }
}

/// `sha256d(data) = SHA256(SHA256(data))`.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    use io::Write;
    let mut w = Writer::default();
    w.write_all(data).expect("Writer is infallible");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        // sha256d("") = 5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456
        let hash = sha256d(b"");
        assert_eq!(
            hex::encode(hash),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }
}

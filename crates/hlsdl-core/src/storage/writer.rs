//! Write-then-rename file writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{remove_if_exists, temp_path};

const WRITE_BUFFER: usize = 256 * 1024;

/// Buffered writer for a `.part` file that becomes visible under its final
/// name only through `finalize`. Dropping it without finalizing deletes the
/// temp file, so failed transfers leave nothing behind.
pub struct AtomicFileWriter {
    file: Option<BufWriter<File>>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
    published: bool,
}

impl AtomicFileWriter {
    /// Create (truncate) the temp file for `final_path`. Any stale file already
    /// at `final_path` is removed first so it cannot be mistaken for a result.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        remove_if_exists(final_path)?;
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            file: Some(BufWriter::with_capacity(WRITE_BUFFER, file)),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
            published: false,
        })
    }

    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already closed"))?;
        file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, sync and atomically rename the temp file to the final path.
    /// Returns the number of bytes written.
    pub fn finalize(mut self) -> io::Result<u64> {
        let writer = self
            .file
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already closed"))?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.temp_path, &self.final_path)?;
        self.published = true;
        Ok(self.written)
    }
}

impl Drop for AtomicFileWriter {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.published {
            if let Err(e) = remove_if_exists(&self.temp_path) {
                tracing::warn!(path = %self.temp_path.display(), "could not remove temp file: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_publishes_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("segment_00000.ts");
        let mut w = AtomicFileWriter::create(&final_path).unwrap();
        w.write(b"hello ").unwrap();
        w.write(b"world").unwrap();
        assert!(!final_path.exists(), "nothing visible before finalize");
        assert!(w.temp_path().exists());
        assert_eq!(w.finalize().unwrap(), 11);
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
        assert!(!temp_path(&final_path).exists());
    }

    #[test]
    fn drop_without_finalize_discards_temp() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("segment_00001.ts");
        {
            let mut w = AtomicFileWriter::create(&final_path).unwrap();
            w.write(b"partial").unwrap();
            assert_eq!(w.written(), 7);
        }
        assert!(!final_path.exists());
        assert!(!temp_path(&final_path).exists());
    }

    #[test]
    fn create_removes_stale_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("segment_00002.ts");
        std::fs::write(&final_path, b"stale").unwrap();
        let w = AtomicFileWriter::create(&final_path).unwrap();
        assert!(!final_path.exists());
        drop(w);
        assert!(!final_path.exists());
    }
}

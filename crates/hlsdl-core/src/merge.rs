//! Ordered concatenation of verified segment files into the final output.
//!
//! The output is assembled under `<output>.part` and renamed into place only
//! after every input was copied, so a truncated merge is never visible at the
//! output path. Memory stays bounded by the copy buffer regardless of size.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::{remove_if_exists, temp_path};

/// Read buffer for each input file.
pub const MERGE_BUFFER_SIZE: usize = 1024 * 1024;
/// Write buffer in front of the output file.
const OUTPUT_BUFFER_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("segment file missing: {}", .0.display())]
    MissingSegment(PathBuf),
    #[error("merge I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove existing output {}: {source}", .path.display())]
    RemoveExisting {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move merged file into {}: {source}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> MergeError + '_ {
    move |source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Deletes the temporary output unless the merge committed.
struct TempOutput {
    path: PathBuf,
    committed: bool,
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = remove_if_exists(&self.path) {
                tracing::warn!(path = %self.path.display(), "could not remove temporary output: {}", e);
            }
        }
    }
}

/// Concatenate `inputs` byte-for-byte, in slice order, into `output`.
/// Returns the number of bytes in the merged file.
///
/// An existing file at `output` is replaced only after the new content is
/// complete; if it cannot be removed the merge fails and it stays as it was.
pub fn merge_segments(inputs: &[PathBuf], output: &Path) -> Result<u64, MergeError> {
    let mut temp = TempOutput {
        path: temp_path(output),
        committed: false,
    };
    let file = File::create(&temp.path).map_err(io_err(&temp.path))?;
    let mut out = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, file);
    let mut buf = vec![0u8; MERGE_BUFFER_SIZE];
    let mut total = 0u64;

    tracing::info!(segments = inputs.len(), output = %output.display(), "merging segments");
    for (i, input) in inputs.iter().enumerate() {
        if !input.exists() {
            return Err(MergeError::MissingSegment(input.clone()));
        }
        total += copy_one(input, &mut out, &mut buf)?;
        out.flush().map_err(io_err(&temp.path))?;

        if i % 10 == 0 || i + 1 == inputs.len() {
            tracing::debug!("merged {}/{} segments", i + 1, inputs.len());
        }
    }

    let file = out
        .into_inner()
        .map_err(|e| io_err(&temp.path)(e.into_error()))?;
    file.sync_all().map_err(io_err(&temp.path))?;
    drop(file);

    if output.exists() {
        std::fs::remove_file(output).map_err(|source| MergeError::RemoveExisting {
            path: output.to_path_buf(),
            source,
        })?;
    }
    std::fs::rename(&temp.path, output).map_err(|source| MergeError::Rename {
        path: output.to_path_buf(),
        source,
    })?;
    temp.committed = true;

    tracing::info!(bytes = total, output = %output.display(), "merge completed");
    Ok(total)
}

fn copy_one<W: Write>(input: &Path, out: &mut W, buf: &mut [u8]) -> Result<u64, MergeError> {
    let mut reader = File::open(input).map_err(io_err(input))?;
    let mut copied = 0u64;
    loop {
        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_err(input)(e)),
        };
        out.write_all(&buf[..n]).map_err(io_err(input))?;
        copied += n as u64;
    }
    Ok(copied)
}

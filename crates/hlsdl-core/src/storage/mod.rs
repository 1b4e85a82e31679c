//! Staging files and their lifecycle.
//!
//! Every segment lands in the staging directory under a name derived from its
//! ordinal. Bytes are written to a `.part` sibling first and only renamed into
//! place once complete, so a file under its final name is always whole.

mod writer;

pub use writer::AtomicFileWriter;

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `seg.ts` → `seg.ts.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// File name for the segment at `ordinal`, zero-padded so names sort in merge order.
pub fn segment_file_name(ordinal: usize) -> String {
    format!("segment_{:05}.ts", ordinal)
}

/// Full staging path for the segment at `ordinal`.
pub fn segment_path(staging_dir: &Path, ordinal: usize) -> PathBuf {
    staging_dir.join(segment_file_name(ordinal))
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove staged segment files (and their `.part` leftovers) for ordinals `0..count`,
/// then the staging directory itself if nothing else is left in it.
///
/// This is narrower than deleting the directory tree: a staging directory that
/// also holds files this run did not create (for example a shared `downloads/`)
/// is kept, along with those files.
pub fn clear_staging(staging_dir: &Path, count: usize) {
    for ordinal in 0..count {
        let path = segment_path(staging_dir, ordinal);
        for p in [temp_path(&path), path] {
            if let Err(e) = remove_if_exists(&p) {
                tracing::warn!(path = %p.display(), "could not remove staged file: {}", e);
            }
        }
    }
    match std::fs::remove_dir(staging_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::debug!(dir = %staging_dir.display(), "staging dir kept: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("segment_00001.ts"));
        assert_eq!(p.to_string_lossy(), "segment_00001.ts.part");
        let p2 = temp_path(Path::new("/tmp/output.ts"));
        assert_eq!(p2.to_string_lossy(), "/tmp/output.ts.part");
    }

    #[test]
    fn segment_names_are_zero_padded_and_sortable() {
        assert_eq!(segment_file_name(0), "segment_00000.ts");
        assert_eq!(segment_file_name(42), "segment_00042.ts");
        let mut names: Vec<String> = [10, 2, 1, 100].iter().map(|i| segment_file_name(*i)).collect();
        names.sort();
        assert_eq!(names[0], "segment_00001.ts");
        assert_eq!(names[3], "segment_00100.ts");
    }

    #[test]
    fn remove_if_exists_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("nope")).unwrap();
    }

    #[test]
    fn clear_staging_removes_segments_and_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("stage");
        std::fs::create_dir_all(&staging).unwrap();
        for i in 0..3 {
            std::fs::write(segment_path(&staging, i), b"x").unwrap();
        }
        std::fs::write(temp_path(&segment_path(&staging, 1)), b"partial").unwrap();
        clear_staging(&staging, 3);
        assert!(!staging.exists());
    }

    #[test]
    fn clear_staging_keeps_dir_with_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("stage");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(segment_path(&staging, 0), b"x").unwrap();
        std::fs::write(staging.join("notes.txt"), b"keep me").unwrap();
        clear_staging(&staging, 1);
        assert!(!segment_path(&staging, 0).exists());
        assert!(staging.join("notes.txt").exists());
    }
}

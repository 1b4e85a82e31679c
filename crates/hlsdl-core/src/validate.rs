//! Transport-stream integrity check for downloaded segments.
//!
//! A heuristic, not a demuxer: MPEG-TS is a sequence of 188-byte packets that
//! each start with the sync byte 0x47. The first three packet windows of the
//! file are inspected and at least one must carry the sync byte.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Size of one MPEG-TS packet.
pub const TS_PACKET_SIZE: usize = 188;
/// Leading byte of every MPEG-TS packet.
pub const SYNC_BYTE: u8 = 0x47;
/// Number of packets inspected from the start of the file.
const SCAN_PACKETS: usize = 3;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("file too small to be a TS segment ({len} bytes, need at least 188)")]
    TooSmall { len: usize },
    #[error("no valid TS sync pattern in the first 3 packets")]
    NoSyncPattern,
    #[error("cannot read segment: {0}")]
    Io(#[from] io::Error),
}

/// Count complete 188-byte windows in `buf` that start with the sync byte.
/// Fails with `TooSmall` when not even one packet fits, and with
/// `NoSyncPattern` when no window matches.
pub fn check_sync(buf: &[u8]) -> Result<usize, ValidationError> {
    if buf.len() < TS_PACKET_SIZE {
        return Err(ValidationError::TooSmall { len: buf.len() });
    }
    let synced = buf
        .chunks_exact(TS_PACKET_SIZE)
        .take(SCAN_PACKETS)
        .filter(|packet| packet[0] == SYNC_BYTE)
        .count();
    if synced == 0 {
        return Err(ValidationError::NoSyncPattern);
    }
    Ok(synced)
}

/// Validate the segment file at `path`. Reads at most three packets.
pub fn validate_ts(path: &Path) -> Result<(), ValidationError> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(TS_PACKET_SIZE * SCAN_PACKETS);
    file.take((TS_PACKET_SIZE * SCAN_PACKETS) as u64)
        .read_to_end(&mut head)?;
    let synced = check_sync(&head)?;
    tracing::trace!(path = %path.display(), synced, "ts sync check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packets(count: usize, synced: &[usize]) -> Vec<u8> {
        let mut buf = vec![0u8; count * TS_PACKET_SIZE];
        for &i in synced {
            buf[i * TS_PACKET_SIZE] = SYNC_BYTE;
        }
        buf
    }

    #[test]
    fn under_one_packet_is_too_small() {
        let buf = vec![SYNC_BYTE; TS_PACKET_SIZE - 1];
        assert!(matches!(
            check_sync(&buf),
            Err(ValidationError::TooSmall { len: 187 })
        ));
        assert!(matches!(check_sync(&[]), Err(ValidationError::TooSmall { len: 0 })));
    }

    #[test]
    fn only_first_packet_synced_is_accepted() {
        let buf = packets(3, &[0]);
        assert_eq!(check_sync(&buf).unwrap(), 1);
    }

    #[test]
    fn no_synced_packet_is_rejected() {
        let buf = packets(3, &[]);
        assert!(matches!(check_sync(&buf), Err(ValidationError::NoSyncPattern)));
    }

    #[test]
    fn trailing_partial_window_is_ignored() {
        // One full packet without sync, then a partial window that starts with 0x47.
        let mut buf = packets(1, &[]);
        buf.push(SYNC_BYTE);
        buf.extend_from_slice(&[0u8; 50]);
        assert!(matches!(check_sync(&buf), Err(ValidationError::NoSyncPattern)));
    }

    #[test]
    fn all_packets_synced() {
        let buf = packets(3, &[0, 1, 2]);
        assert_eq!(check_sync(&buf).unwrap(), 3);
    }

    #[test]
    fn validate_ts_reads_only_the_head() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.ts");
        // Three unsynced packets followed by synced ones: only the head counts.
        let mut buf = packets(3, &[]);
        buf.extend(packets(5, &[0, 1, 2, 3, 4]));
        std::fs::write(&path, &buf).unwrap();
        assert!(matches!(validate_ts(&path), Err(ValidationError::NoSyncPattern)));

        std::fs::write(&path, packets(10, &[2])).unwrap();
        validate_ts(&path).unwrap();
    }

    #[test]
    fn validate_ts_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_ts(&dir.path().join("missing.ts")),
            Err(ValidationError::Io(_))
        ));
    }
}

//! Per-collection append-only journal.
//!
//! Every mutation of a collection is appended to `<collection>.journal`
//! before it becomes visible in memory. Opening a store replays the journals.
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [ENTRY 1: codec frame of JournalEntry]
//! [ENTRY 2: codec frame of JournalEntry]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::key::StoreKey;

use super::codec;

/// File extension of collection journals.
pub const JOURNAL_EXTENSION: &str = "journal";

/// A single journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in this journal, starting at 1.
    pub sequence: u64,
    /// When this entry was written.
    pub timestamp: DateTime<Utc>,
    /// The mutation.
    pub kind: JournalEntryKind,
}

/// The mutation recorded by a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalEntryKind {
    /// New document under a freshly assigned key.
    Insert { key: StoreKey, document: Value },
    /// Document replaced (or upserted) under an existing key.
    Replace { key: StoreKey, document: Value },
}

/// Result of replaying a journal file.
#[derive(Debug, Default)]
pub struct Replay {
    /// Entries read, in order.
    pub entries: Vec<JournalEntry>,
    /// True if the file ended inside a frame (torn final write).
    pub truncated_tail: bool,
}

/// Append-only journal of one collection.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    sequence: u64,
    sync_on_write: bool,
}

impl Journal {
    /// Create a new journal, or open an existing one for appending.
    ///
    /// `sequence` is the last sequence already present in the file.
    pub fn open(path: &Path, sequence: u64, sync_on_write: bool) -> IoResult<Self> {
        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if fresh {
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            sequence,
            sync_on_write,
        })
    }

    /// Append an entry, returning its sequence number.
    pub fn append(&mut self, kind: JournalEntryKind) -> IoResult<u64> {
        let entry = JournalEntry {
            sequence: self.sequence + 1,
            timestamp: Utc::now(),
            kind,
        };
        let encoded = codec::encode(&entry)?;

        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        if self.sync_on_write {
            self.writer.get_ref().sync_all()?;
        }

        self.sequence = entry.sequence;
        Ok(self.sequence)
    }

    /// Last sequence number written.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every complete entry of the journal at `path`.
    ///
    /// A torn final frame ends the replay and is reported through
    /// [`Replay::truncated_tail`]; checksum failures are errors. A file
    /// shorter than the header, left by a crash during creation, is reported
    /// as torn with no entries.
    pub fn replay(path: &Path) -> IoResult<Replay> {
        let file = File::open(path)?;
        if file.metadata()?.len() < codec::HEADER_LEN {
            warn!(path = %path.display(), "journal header incomplete; collection recovered empty");
            return Ok(Replay {
                entries: Vec::new(),
                truncated_tail: true,
            });
        }
        let mut reader = BufReader::new(file);
        codec::read_header(&mut reader)?;

        let mut replay = Replay::default();
        loop {
            match codec::decode_next::<JournalEntry>(&mut reader) {
                Ok(Some(entry)) => replay.entries.push(entry),
                Ok(None) => break,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    warn!(path = %path.display(), "journal ends inside an entry; ignoring torn tail");
                    replay.truncated_tail = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(replay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("households.journal");
        let key = StoreKey::generate();

        {
            let mut journal = Journal::open(&path, 0, false).unwrap();
            journal
                .append(JournalEntryKind::Insert { key: key.clone(), document: json!({ "v": 1 }) })
                .unwrap();
            let seq = journal
                .append(JournalEntryKind::Replace { key: key.clone(), document: json!({ "v": 2 }) })
                .unwrap();
            assert_eq!(seq, 2);
        }

        let replay = Journal::replay(&path).unwrap();
        assert!(!replay.truncated_tail);
        assert_eq!(replay.entries.len(), 2);
        assert!(matches!(replay.entries[0].kind, JournalEntryKind::Insert { .. }));
        assert_eq!(replay.entries[1].sequence, 2);
    }

    #[test]
    fn test_reopen_continues_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.journal");
        {
            let mut journal = Journal::open(&path, 0, false).unwrap();
            journal
                .append(JournalEntryKind::Insert { key: StoreKey::generate(), document: json!({}) })
                .unwrap();
        }
        let mut journal = Journal::open(&path, 1, false).unwrap();
        let seq = journal
            .append(JournalEntryKind::Insert { key: StoreKey::generate(), document: json!({}) })
            .unwrap();
        assert_eq!(seq, 2);
        assert_eq!(Journal::replay(&path).unwrap().entries.len(), 2);
    }

    #[test]
    fn test_torn_tail_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.journal");
        {
            let mut journal = Journal::open(&path, 0, true).unwrap();
            for i in 0..3 {
                journal
                    .append(JournalEntryKind::Insert {
                        key: StoreKey::generate(),
                        document: json!({ "i": i }),
                    })
                    .unwrap();
            }
        }
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        file.set_len(len - 4).unwrap();

        let replay = Journal::replay(&path).unwrap();
        assert!(replay.truncated_tail);
        assert_eq!(replay.entries.len(), 2);
    }

    #[test]
    fn test_short_header_replays_as_torn() {
        let dir = tempdir().unwrap();
        for contents in [&b""[..], &codec::MAGIC[..3]] {
            let path = dir.path().join("c.journal");
            std::fs::write(&path, contents).unwrap();

            let replay = Journal::replay(&path).unwrap();
            assert!(replay.truncated_tail);
            assert!(replay.entries.is_empty());
        }
    }
}

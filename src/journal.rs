//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The durable record store the engine treats as an external collaborator (§1, §4.6): accepted
// orders and executed trades are written here transactionally before a book mutation commits.
// Only a minimal sink is provided — its query surface is out of scope.
//--------------------------------------------------------------------------------------------------

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Trade;
use crate::model::Order;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal record failed checksum validation")]
    Checksum,

    #[error("malformed journal record: {0}")]
    Malformed(String),

    #[error("unsupported journal_uri scheme: {0}")]
    UnsupportedScheme(String),
}

/// One durable fact. A submit transaction writes an `OrderAccepted` followed by zero or more
/// `TradeExecuted` records; cancel/modify write their own record kind. Journal replay recovery
/// (§4.7) folds these back into resting order state in the order they appear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalRecord {
    OrderAccepted(Order),
    OrderCancelled { symbol: String, order_id: String },
    OrderModified {
        symbol: String,
        order_id: String,
        new_qty: u64,
        new_price: i64,
    },
    TradeExecuted(Trade),
}

/// A durable, append-only sink for journal records. Implementations must tolerate concurrent
/// appenders or serialize internally (§5) — the engine treats this as a thread-safe sink and
/// calls `append` while holding the book lock, so it must stay cheap.
pub trait Journal: Send + Sync {
    fn append(&self, records: &[JournalRecord]) -> Result<(), JournalError>;

    /// All records in the order they were appended. Used for journal-replay recovery when no
    /// usable snapshot exists.
    fn replay(&self) -> Result<Vec<JournalRecord>, JournalError>;
}

/// Discards everything. The default when `journal_uri` is unset — suitable for tests and for
/// running without durability guarantees.
#[derive(Debug, Default)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn append(&self, _records: &[JournalRecord]) -> Result<(), JournalError> {
        Ok(())
    }

    fn replay(&self) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(Vec::new())
    }
}

/// Append-only, newline-delimited JSON journal. Each line is `<json>\t<crc32 hex>`; the
/// checksum lets `replay` detect a truncated final line (e.g. a crash mid-write) instead of
/// silently accepting a corrupt record.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJournal {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Parses a `journal_uri` of the form `file://<path>`. Any other scheme is rejected —
    /// this crate supports exactly one journal backend.
    pub fn from_uri(uri: &str) -> Result<Self, JournalError> {
        let path = uri
            .strip_prefix("file://")
            .ok_or_else(|| JournalError::UnsupportedScheme(uri.to_string()))?;
        Self::open(path)
    }
}

impl Journal for FileJournal {
    fn append(&self, records: &[JournalRecord]) -> Result<(), JournalError> {
        let mut file = self.file.lock();
        for record in records {
            let json =
                serde_json::to_string(record).map_err(|e| JournalError::Malformed(e.to_string()))?;
            let checksum = crc32fast::hash(json.as_bytes());
            writeln!(file, "{json}\t{checksum:08x}")?;
        }
        file.flush()?;
        Ok(())
    }

    fn replay(&self) -> Result<Vec<JournalRecord>, JournalError> {
        replay_path(&self.path)
    }
}

fn replay_path(path: &Path) -> Result<Vec<JournalRecord>, JournalError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (json, checksum_hex) = line
            .rsplit_once('\t')
            .ok_or_else(|| JournalError::Malformed(format!("line {lineno} missing checksum")))?;
        let expected = u32::from_str_radix(checksum_hex, 16)
            .map_err(|_| JournalError::Malformed(format!("line {lineno} bad checksum encoding")))?;
        if crc32fast::hash(json.as_bytes()) != expected {
            return Err(JournalError::Checksum);
        }
        let record: JournalRecord =
            serde_json::from_str(json).map_err(|e| JournalError::Malformed(e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderStatus, Side};
    use chrono::Utc;

    fn sample_order() -> Order {
        Order {
            id: "o1".into(),
            user_id: "u1".into(),
            symbol: "X".into(),
            side: Side::Buy,
            price: 100,
            original_qty: 5,
            filled_qty: 0,
            status: OrderStatus::Pending,
            sequence: 1,
            accepted_at: Utc::now(),
        }
    }

    #[test]
    fn null_journal_discards_everything() {
        let journal = NullJournal;
        journal
            .append(&[JournalRecord::OrderAccepted(sample_order())])
            .unwrap();
        assert!(journal.replay().unwrap().is_empty());
    }

    #[test]
    fn file_journal_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.ndjson");
        let journal = FileJournal::open(&path).unwrap();

        journal
            .append(&[JournalRecord::OrderAccepted(sample_order())])
            .unwrap();
        journal
            .append(&[JournalRecord::OrderCancelled {
                symbol: "X".into(),
                order_id: "o1".into(),
            }])
            .unwrap();

        let records = journal.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], JournalRecord::OrderAccepted(_)));
        assert!(matches!(records[1], JournalRecord::OrderCancelled { .. }));
    }

    #[test]
    fn truncated_final_line_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.ndjson");
        let journal = FileJournal::open(&path).unwrap();
        journal
            .append(&[JournalRecord::OrderAccepted(sample_order())])
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let truncated = &contents[..contents.len() - 5];
        std::fs::write(&path, truncated).unwrap();

        let err = replay_path(&path).unwrap_err();
        assert!(matches!(err, JournalError::Checksum | JournalError::Malformed(_)));
    }

    #[test]
    fn from_uri_rejects_unsupported_scheme() {
        let err = FileJournal::from_uri("s3://bucket/key").unwrap_err();
        assert!(matches!(err, JournalError::UnsupportedScheme(_)));
    }
}

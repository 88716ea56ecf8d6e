//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// On-disk snapshot format and crash-atomic writer/reader (§4.7, §6). A snapshot captures every
// resting order across every symbol plus the acceptance-sequence high-water mark, and is the
// fast path for recovery: orders are re-inserted without re-running matching, since a
// consistent snapshot is by invariant already non-crossed.
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Order, OrderStatus, Side};

const FORMAT_VERSION: u32 = 1;
const FILE_PREFIX: &str = "snapshot-";
const FILE_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("snapshot file is truncated or fails checksum validation")]
    Corrupt,
}

/// A resting order as recorded in a snapshot — the attributes named in §4.7, which is
/// everything needed to `restore` it without re-deriving `status` from a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOrder {
    pub id: String,
    pub user_id: String,
    pub side: Side,
    pub price: i64,
    pub original_qty: u64,
    pub filled_qty: u64,
    pub status: OrderStatus,
    pub sequence: u64,
    pub accepted_at: DateTime<Utc>,
}

impl SnapshotOrder {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            user_id: order.user_id.clone(),
            side: order.side,
            price: order.price,
            original_qty: order.original_qty,
            filled_qty: order.filled_qty,
            status: order.status,
            sequence: order.sequence,
            accepted_at: order.accepted_at,
        }
    }

    pub fn into_order(self, symbol: String) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            symbol,
            side: self.side,
            price: self.price,
            original_qty: self.original_qty,
            filled_qty: self.filled_qty,
            status: self.status,
            sequence: self.sequence,
            accepted_at: self.accepted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub format_version: u32,
    pub sequence_high_water_mark: u64,
    pub taken_at: DateTime<Utc>,
    pub symbols: HashMap<String, Vec<SnapshotOrder>>,
}

impl EngineSnapshot {
    pub fn new(sequence_high_water_mark: u64, taken_at: DateTime<Utc>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            sequence_high_water_mark,
            taken_at,
            symbols: HashMap::new(),
        }
    }
}

/// Writes `snapshot` using the rename-on-close pattern: serialize to a `.tmp` file, fsync,
/// rename over the final path. A reader never observes a partially-written file under this
/// name. Deletes older generations beyond `retain`.
pub fn write(dir: &Path, snapshot: &EngineSnapshot, retain: usize) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let file_name = format!(
        "{FILE_PREFIX}{}{FILE_SUFFIX}",
        snapshot.taken_at.format("%Y%m%dT%H%M%S%.6f")
    );
    let final_path = dir.join(file_name);
    let tmp_path = final_path.with_extension("tmp");

    let body = serde_json::to_string(snapshot)?;
    let checksum = crc32fast::hash(body.as_bytes());

    {
        let mut tmp = File::create(&tmp_path)?;
        writeln!(tmp, "{body}")?;
        writeln!(tmp, "{checksum:08x}")?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, &final_path)?;

    prune_old_generations(dir, retain)?;
    Ok(final_path)
}

fn prune_old_generations(dir: &Path, retain: usize) -> Result<(), SnapshotError> {
    let mut files = list_snapshot_files(dir)?;
    files.sort();
    if files.len() > retain {
        for stale in &files[..files.len() - retain] {
            fs::remove_file(stale)?;
        }
    }
    Ok(())
}

fn list_snapshot_files(dir: &Path) -> Result<Vec<PathBuf>, SnapshotError> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Loads the most recent snapshot in `dir`, or `None` if the directory holds none. A
/// checksum failure on the newest file is reported rather than silently falling back to an
/// older generation — callers treat it as fatal to startup (§7, `Corruption`).
pub fn load_latest(dir: &Path) -> Result<Option<EngineSnapshot>, SnapshotError> {
    let mut files = list_snapshot_files(dir)?;
    files.sort();
    let Some(latest) = files.pop() else {
        return Ok(None);
    };
    Ok(Some(load(&latest)?))
}

fn load(path: &Path) -> Result<EngineSnapshot, SnapshotError> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;

    let mut lines = contents.lines();
    let body = lines.next().ok_or(SnapshotError::Corrupt)?;
    let checksum_hex = lines.next().ok_or(SnapshotError::Corrupt)?;
    let expected =
        u32::from_str_radix(checksum_hex.trim(), 16).map_err(|_| SnapshotError::Corrupt)?;
    if crc32fast::hash(body.as_bytes()) != expected {
        return Err(SnapshotError::Corrupt);
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut snapshot = EngineSnapshot::new(42, Utc::now());
        snapshot.symbols.insert(
            "X".into(),
            vec![SnapshotOrder {
                id: "o1".into(),
                user_id: "u1".into(),
                side: Side::Buy,
                price: 100,
                original_qty: 5,
                filled_qty: 0,
                status: OrderStatus::Pending,
                sequence: 1,
                accepted_at: Utc::now(),
            }],
        );

        write(dir.path(), &snapshot, 5).unwrap();
        let loaded = load_latest(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.sequence_high_water_mark, 42);
        assert_eq!(loaded.symbols["X"].len(), 1);
    }

    #[test]
    fn retention_keeps_only_latest_n_generations() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5u64 {
            let snapshot = EngineSnapshot::new(i, Utc::now() + chrono::Duration::milliseconds(i as i64));
            write(dir.path(), &snapshot, 3).unwrap();
        }
        let files = list_snapshot_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn missing_directory_has_no_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(load_latest(&missing).unwrap().is_none());
    }

    #[test]
    fn corrupted_checksum_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = EngineSnapshot::new(1, Utc::now());
        let path = write(dir.path(), &snapshot, 5).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let body = lines.next().unwrap();
        let checksum_line = lines.next().unwrap();
        let tampered_body = format!("{body} ");
        fs::write(&path, format!("{tampered_body}\n{checksum_line}\n")).unwrap();

        assert!(matches!(
            load_latest(dir.path()),
            Err(SnapshotError::Corrupt)
        ));
    }
}

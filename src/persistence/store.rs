//! Score Stores
//!
//! The persistence collaborator. `save` always returns the full, trimmed,
//! descending list after the insert so callers can refresh their view.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::persistence::leaderboard::{HighScoreRecord, Leaderboard, MAX_HIGH_SCORES};

/// Namespace the scores are kept under.
pub const SCORES_NAMESPACE: &str = "SuperLancerScores";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Another user of the store panicked mid-write.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Leaderboard persistence.
pub trait ScoreStore: Send + Sync {
    /// All records, highest score first.
    fn load_all(&self) -> Result<Vec<HighScoreRecord>, StoreError>;

    /// Insert, re-sort, truncate and persist. Returns the stored list.
    fn save(&self, record: HighScoreRecord) -> Result<Vec<HighScoreRecord>, StoreError>;
}

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoresDocument {
    #[serde(default)]
    scores_list: Vec<HighScoreRecord>,
}

// =============================================================================
// JSON FILE STORE
// =============================================================================

/// Scores in a single JSON file, `{"scores_list": [...]}`.
pub struct JsonFileStore {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    /// Store named after the scores namespace inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, capacity: usize) -> Self {
        Self::new(dir.as_ref().join(format!("{SCORES_NAMESPACE}.json")), capacity)
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_board(&self) -> Result<Leaderboard, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no score file yet");
                return Ok(Leaderboard::new(self.capacity));
            }
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Leaderboard::new(self.capacity));
        }
        let document: ScoresDocument = serde_json::from_str(&data)?;
        Ok(Leaderboard::from_records(document.scores_list, self.capacity))
    }

    fn write_board(&self, board: &Leaderboard) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let document = ScoresDocument {
            scores_list: board.entries().to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(error = %e, "rename failed, removing temp file");
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<HighScoreRecord>, StoreError> {
        Ok(self.read_board()?.into_records())
    }

    fn save(&self, record: HighScoreRecord) -> Result<Vec<HighScoreRecord>, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut board = self.read_board()?;
        board.insert(record);
        self.write_board(&board)?;
        Ok(board.into_records())
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store for tests and headless runs.
pub struct MemoryStore {
    board: Mutex<Leaderboard>,
}

impl MemoryStore {
    /// Empty store with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            board: Mutex::new(Leaderboard::new(capacity)),
        }
    }

    /// Store pre-filled with records.
    pub fn with_records(records: Vec<HighScoreRecord>, capacity: usize) -> Self {
        Self {
            board: Mutex::new(Leaderboard::from_records(records, capacity)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MAX_HIGH_SCORES)
    }
}

impl ScoreStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<HighScoreRecord>, StoreError> {
        let board = self.board.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(board.entries().to_vec())
    }

    fn save(&self, record: HighScoreRecord) -> Result<Vec<HighScoreRecord>, StoreError> {
        let mut board = self.board.lock().map_err(|_| StoreError::Poisoned)?;
        board.insert(record);
        Ok(board.entries().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::leaderboard::GeoPoint;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("super-lancer-{tag}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = temp_dir("missing");
        let store = JsonFileStore::in_dir(&dir, MAX_HIGH_SCORES);
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.path().ends_with("SuperLancerScores.json"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_round_trip() {
        let dir = temp_dir("roundtrip");
        let store = JsonFileStore::in_dir(&dir, MAX_HIGH_SCORES);

        let record = HighScoreRecord::new("ann", 150, GeoPoint::new(32.0625, 34.7421875));
        store.save(record.clone()).unwrap();
        store.save(HighScoreRecord::new("bob", 200, GeoPoint::UNKNOWN)).unwrap();

        // Fresh handle reads what the first wrote
        let reopened = JsonFileStore::in_dir(&dir, MAX_HIGH_SCORES);
        let records = reopened.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "bob");
        assert_eq!(records[1], record);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert!(raw["scores_list"].is_array());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_truncates() {
        let dir = temp_dir("truncate");
        let store = JsonFileStore::in_dir(&dir, MAX_HIGH_SCORES);
        for score in 0..15 {
            store.save(HighScoreRecord::new("p", score, GeoPoint::UNKNOWN)).unwrap();
        }
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records[0].score, 14);
        assert_eq!(records[9].score, 5);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = temp_dir("corrupt");
        let store = JsonFileStore::in_dir(&dir, MAX_HIGH_SCORES);
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load_all(), Err(StoreError::Serde(_))));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let records: Vec<HighScoreRecord> = (1..=10)
            .rev()
            .map(|i| HighScoreRecord::new("p", i * 10, GeoPoint::UNKNOWN))
            .collect();
        let store = MemoryStore::with_records(records, MAX_HIGH_SCORES);

        let saved = store.save(HighScoreRecord::new("new", 95, GeoPoint::UNKNOWN)).unwrap();
        let scores: Vec<u32> = saved.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![100, 95, 90, 80, 70, 60, 50, 40, 30, 20]);
        assert_eq!(store.load_all().unwrap(), saved);
    }
}

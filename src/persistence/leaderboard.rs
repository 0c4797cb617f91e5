//! Leaderboard
//!
//! Bounded, descending-by-score list of finished runs. Ties keep insertion
//! order: a new record goes after every existing record with the same score.

use serde::{Serialize, Deserialize};

/// Number of records kept.
pub const MAX_HIGH_SCORES: usize = 10;

/// Reference point used to centre the map when nothing better is known.
pub const REFERENCE_POINT: GeoPoint = GeoPoint { lat: 32.01, lon: 34.74 };

// =============================================================================
// POSITION
// =============================================================================

/// Geographic position in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lon: f64,
}

impl GeoPoint {
    /// Sentinel for "no position".
    pub const UNKNOWN: GeoPoint = GeoPoint { lat: 0.0, lon: 0.0 };

    /// Create a position.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True for the sentinel.
    pub fn is_unknown(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    /// True when both coordinates are set (what the map can pin).
    pub fn is_mappable(&self) -> bool {
        self.lat != 0.0 && self.lon != 0.0
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Final result of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    /// Player name
    pub name: String,
    /// Final score
    pub score: u32,
    /// Latitude (0.0 when unknown)
    pub lat: f64,
    /// Longitude (0.0 when unknown)
    pub lon: f64,
}

impl HighScoreRecord {
    /// Create a record.
    pub fn new(name: impl Into<String>, score: u32, position: GeoPoint) -> Self {
        Self {
            name: name.into(),
            score,
            lat: position.lat,
            lon: position.lon,
        }
    }

    /// Where the run was played.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

// =============================================================================
// LEADERBOARD
// =============================================================================

/// Top-N records, highest score first.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaderboard {
    entries: Vec<HighScoreRecord>,
    capacity: usize,
}

impl Leaderboard {
    /// Empty leaderboard.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from stored records, restoring order and the size bound.
    pub fn from_records(records: Vec<HighScoreRecord>, capacity: usize) -> Self {
        let mut entries = records;
        // Stable sort keeps stored order among equal scores
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Insert a record. Returns its rank (0-based) if it made the board.
    pub fn insert(&mut self, record: HighScoreRecord) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|existing| existing.score < record.score)
            .unwrap_or(self.entries.len());
        if rank >= self.capacity {
            return None;
        }
        self.entries.insert(rank, record);
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    /// True if a score would make the board.
    pub fn qualifies(&self, score: u32) -> bool {
        self.entries.len() < self.capacity
            || self.entries.last().is_some_and(|last| last.score < score)
    }

    /// Records, highest first.
    pub fn entries(&self) -> &[HighScoreRecord] {
        &self.entries
    }

    /// Consume into records.
    pub fn into_records(self) -> Vec<HighScoreRecord> {
        self.entries
    }

    /// Best score, if any.
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|r| r.score)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that can be pinned on a map.
    pub fn markers(&self) -> impl Iterator<Item = &HighScoreRecord> {
        self.entries.iter().filter(|r| r.position().is_mappable())
    }

    /// Where a map of this board should centre: the best run's position,
    /// or the reference point when that is unknown.
    pub fn focus(&self) -> GeoPoint {
        self.entries
            .first()
            .map(HighScoreRecord::position)
            .filter(|p| !p.is_unknown())
            .unwrap_or(REFERENCE_POINT)
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(MAX_HIGH_SCORES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(name: &str, score: u32) -> HighScoreRecord {
        HighScoreRecord::new(name, score, GeoPoint::UNKNOWN)
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let records = (1..=10).rev().map(|i| record("p", i * 10)).collect();
        let mut board = Leaderboard::from_records(records, MAX_HIGH_SCORES);

        assert_eq!(board.insert(record("new", 95)), Some(1));

        let scores: Vec<u32> = board.entries().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![100, 95, 90, 80, 70, 60, 50, 40, 30, 20]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut board = Leaderboard::default();
        board.insert(record("first", 50));
        board.insert(record("second", 50));
        board.insert(record("third", 70));

        let names: Vec<&str> = board.entries().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_full_board_rejects_low_score() {
        let mut board = Leaderboard::new(2);
        board.insert(record("a", 10));
        board.insert(record("b", 20));
        assert!(!board.qualifies(10));
        assert_eq!(board.insert(record("c", 10)), None);
        assert_eq!(board.len(), 2);
        assert!(board.qualifies(11));
    }

    #[test]
    fn test_markers_need_both_coordinates() {
        let mut board = Leaderboard::default();
        board.insert(HighScoreRecord::new("a", 30, GeoPoint::new(32.0, 34.7)));
        board.insert(HighScoreRecord::new("b", 20, GeoPoint::new(0.0, 34.7)));
        board.insert(HighScoreRecord::new("c", 10, GeoPoint::UNKNOWN));

        let names: Vec<&str> = board.markers().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_focus() {
        let mut board = Leaderboard::default();
        assert_eq!(board.focus(), REFERENCE_POINT);

        board.insert(HighScoreRecord::new("a", 30, GeoPoint::new(40.7, -74.0)));
        board.insert(HighScoreRecord::new("b", 10, GeoPoint::new(1.0, 1.0)));
        assert_eq!(board.focus(), GeoPoint::new(40.7, -74.0));
    }

    #[test]
    fn test_record_json_field_names() {
        let json = serde_json::to_value(HighScoreRecord::new("ann", 120, GeoPoint::new(1.5, 2.5))).unwrap();
        assert_eq!(json, serde_json::json!({"name": "ann", "score": 120, "lat": 1.5, "lon": 2.5}));
    }

    proptest! {
        #[test]
        fn board_stays_bounded_and_sorted(scores in proptest::collection::vec(0u32..500, 0..40)) {
            let mut board = Leaderboard::default();
            for (i, score) in scores.iter().enumerate() {
                board.insert(record(&i.to_string(), *score));
            }

            prop_assert_eq!(board.len(), scores.len().min(MAX_HIGH_SCORES));
            for pair in board.entries().windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    let a: usize = pair[0].name.parse().unwrap();
                    let b: usize = pair[1].name.parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}

//! Persistence Module
//!
//! Leaderboard logic and the score store collaborator.
//!
//! - `leaderboard`: Records, positions, bounded top-N ordering
//! - `store`: `ScoreStore` trait with JSON-file and in-memory stores

pub mod leaderboard;
pub mod store;

pub use leaderboard::{GeoPoint, HighScoreRecord, Leaderboard, MAX_HIGH_SCORES};
pub use store::{JsonFileStore, MemoryStore, ScoreStore, StoreError};

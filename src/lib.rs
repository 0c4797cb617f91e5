//! # Super Lancer
//!
//! Lane-based dodge-and-collect game simulation with a deterministic tick loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SUPER LANCER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rect.rs     - Integer rectangles (hit regions)          │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── lane.rs     - Lane layout                               │
//! │  ├── state.rs    - Run state machine and obstacles           │
//! │  ├── spawner.rs  - Weighted obstacle spawning                │
//! │  ├── motion.rs   - Obstacle fall and expiry                  │
//! │  ├── collision.rs- Car-vs-obstacle detection                 │
//! │  └── tick.rs     - Spawn, physics and distance ticks         │
//! │                                                              │
//! │  persistence/    - Leaderboard and score stores              │
//! │                                                              │
//! │  runtime/        - Async controller (non-deterministic)      │
//! │  ├── controller.rs - Tick scheduling, commands, game over    │
//! │  ├── schedule.rs - The three tick intervals                  │
//! │  ├── protocol.rs - Commands and snapshots                    │
//! │  ├── feedback.rs - Feedback and listener collaborators       │
//! │  └── location.rs - Position lookup and fallback region       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - Integer time and integer geometry in the simulation
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the run seed and the recorded intents, a run replays to the
//! **identical state hash**.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod persistence;
pub mod runtime;
pub mod config;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use config::{GameConfig, ConfigError};
pub use game::state::{GameState, Mode, ObstacleKind, RunPhase, RunError};
pub use persistence::leaderboard::{GeoPoint, HighScoreRecord, Leaderboard};
pub use persistence::store::{ScoreStore, JsonFileStore, MemoryStore};
pub use runtime::controller::{RunController, RunHandle, RunOutcome, Collaborators};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lives at the start of a run, and the cap
pub const DEFAULT_MAX_LIVES: u8 = 3;

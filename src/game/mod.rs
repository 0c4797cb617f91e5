//! Game Logic Module
//!
//! All run simulation code. 100% deterministic given the run seed.
//!
//! ## Module Structure
//!
//! - `lane`: Lane layout and lane-to-position mapping
//! - `input`: Lane-change intents and intent recording
//! - `state`: Run state machine, obstacles
//! - `spawner`: Weighted-random obstacle spawning
//! - `motion`: Obstacle fall and expiry
//! - `collision`: Car-vs-obstacle hit regions and overlap tests
//! - `tick`: Spawn, physics and distance ticks; replay
//! - `events`: Game events for feedback and replay

pub mod lane;
pub mod input;
pub mod state;
pub mod spawner;
pub mod motion;
pub mod collision;
pub mod tick;
pub mod events;

// Re-export key types
pub use lane::LaneModel;
pub use input::{Intent, IntentLog, TimedIntent};
pub use state::{GameState, Mode, Obstacle, ObstacleKind, RunError, RunPhase};
pub use tick::{RunConfig, TickError, TickResult};
pub use events::{GameEvent, GameEventData};

//! Runtime Layer
//!
//! Async run controller and its collaborators.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod protocol;
pub mod schedule;
pub mod feedback;
pub mod location;
pub mod controller;

pub use protocol::{RunCommand, RunSnapshot, ObstacleView};
pub use schedule::{TickSchedule, TickKind};
pub use feedback::{Feedback, RunListener, Sound, LogFeedback, NoopListener};
pub use location::{Locator, FixedLocator, NoLocation, FallbackRegion};
pub use controller::{RunController, RunHandle, RunOutcome, Collaborators};

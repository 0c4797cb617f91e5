//! Core deterministic primitives.
//!
//! Integer geometry, seeded randomness and state hashing. Nothing in here
//! knows about lanes, obstacles or the run loop.

pub mod rect;
pub mod rng;
pub mod hash;

// Re-export core types
pub use rect::Rect;
pub use rng::{DeterministicRng, derive_run_seed};
pub use hash::{StateHash, StateHasher, compute_state_hash};

//! Game Events
//!
//! Events generated during ticks. The run controller drains them after every
//! tick and forwards them to feedback and listeners; they never feed back into
//! the simulation.

use serde::{Serialize, Deserialize};
use crate::game::state::{ObstacleKind, RunPhase};
use crate::persistence::leaderboard::HighScoreRecord;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A new obstacle entered the top of the playfield
    ObstacleSpawned {
        obstacle_id: u32,
        kind: ObstacleKind,
        lane: u8,
    },

    /// The car hit a rock
    Crashed {
        obstacle_id: u32,
        lane: u8,
    },

    /// A life was taken away
    LifeLost {
        lives_left: u8,
    },

    /// A heart restored a life (or would have, at full lives)
    LifeGained {
        obstacle_id: u32,
        lives: u8,
    },

    /// A coin was picked up
    CoinCollected {
        obstacle_id: u32,
        points: u32,
        new_score: u32,
    },

    /// A rock fell past the car without hitting it
    RockAvoided {
        obstacle_id: u32,
        points: u32,
    },

    /// Run phase changed
    PhaseChanged {
        old_phase: RunPhase,
        new_phase: RunPhase,
    },

    /// Run finished and its leaderboard record was produced
    GameOver {
        record: HighScoreRecord,
        distance: u32,
    },
}

/// A game event stamped with the physics tick it occurred on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Physics tick when event occurred
    pub tick: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Create obstacle spawned event.
    pub fn obstacle_spawned(tick: u32, obstacle_id: u32, kind: ObstacleKind, lane: u8) -> Self {
        Self::new(tick, GameEventData::ObstacleSpawned { obstacle_id, kind, lane })
    }

    /// Create crash event.
    pub fn crashed(tick: u32, obstacle_id: u32, lane: u8) -> Self {
        Self::new(tick, GameEventData::Crashed { obstacle_id, lane })
    }

    /// Create life lost event.
    pub fn life_lost(tick: u32, lives_left: u8) -> Self {
        Self::new(tick, GameEventData::LifeLost { lives_left })
    }

    /// Create life gained event.
    pub fn life_gained(tick: u32, obstacle_id: u32, lives: u8) -> Self {
        Self::new(tick, GameEventData::LifeGained { obstacle_id, lives })
    }

    /// Create coin collected event.
    pub fn coin_collected(tick: u32, obstacle_id: u32, points: u32, new_score: u32) -> Self {
        Self::new(
            tick,
            GameEventData::CoinCollected {
                obstacle_id,
                points,
                new_score,
            },
        )
    }

    /// Create rock avoided event.
    pub fn rock_avoided(tick: u32, obstacle_id: u32, points: u32) -> Self {
        Self::new(tick, GameEventData::RockAvoided { obstacle_id, points })
    }

    /// Create phase changed event.
    pub fn phase_changed(tick: u32, old_phase: RunPhase, new_phase: RunPhase) -> Self {
        Self::new(tick, GameEventData::PhaseChanged { old_phase, new_phase })
    }

    /// Create game over event.
    pub fn game_over(tick: u32, record: HighScoreRecord, distance: u32) -> Self {
        Self::new(tick, GameEventData::GameOver { record, distance })
    }

    /// True for events that cost the player something (crash feedback).
    pub fn is_crash(&self) -> bool {
        matches!(self.data, GameEventData::Crashed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_stamp_tick() {
        let event = GameEvent::coin_collected(42, 7, 50, 150);
        assert_eq!(event.tick, 42);
        assert_eq!(
            event.data,
            GameEventData::CoinCollected {
                obstacle_id: 7,
                points: 50,
                new_score: 150,
            }
        );
    }

    #[test]
    fn test_is_crash() {
        assert!(GameEvent::crashed(1, 0, 2).is_crash());
        assert!(!GameEvent::life_lost(1, 2).is_crash());
    }

    #[test]
    fn test_event_serializes() {
        let event = GameEvent::phase_changed(0, RunPhase::Menu, RunPhase::Running);
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

//! Run Protocol Messages
//!
//! Commands into a running controller and the per-tick view it publishes.
//! Serialized as JSON so a front end can sit across any transport.

use serde::{Serialize, Deserialize};

use crate::game::input::Intent;
use crate::game::state::{GameState, ObstacleKind};

// =============================================================================
// COMMANDS
// =============================================================================

/// Commands accepted by a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunCommand {
    /// Car one lane left.
    MoveLeft,
    /// Car one lane right.
    MoveRight,
    /// Suspend all ticks.
    Pause,
    /// Resume ticks on a fresh schedule.
    Resume,
    /// Quit to the menu without a record.
    Stop,
}

impl RunCommand {
    /// The lane-change intent carried by this command, if any.
    pub fn intent(self) -> Option<Intent> {
        match self {
            RunCommand::MoveLeft => Some(Intent::MoveLeft),
            RunCommand::MoveRight => Some(Intent::MoveRight),
            _ => None,
        }
    }
}

impl From<Intent> for RunCommand {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::MoveLeft => RunCommand::MoveLeft,
            Intent::MoveRight => RunCommand::MoveRight,
        }
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// A live obstacle as presentation sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    /// Obstacle id
    pub id: u32,
    /// Kind
    pub kind: ObstacleKind,
    /// Lane index
    pub lane: u8,
    /// Vertical progress in [0, 1]
    pub progress: f32,
}

/// Per-tick presentation view of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Physics tick this view was taken after
    pub tick: u32,
    /// Current score
    pub score: u32,
    /// Distance travelled
    pub distance: u32,
    /// Remaining lives
    pub lives: u8,
    /// Lane the car occupies
    pub car_lane: u8,
    /// True while paused
    pub paused: bool,
    /// Live obstacles, ascending by id
    pub obstacles: Vec<ObstacleView>,
}

impl RunSnapshot {
    /// Capture the current state.
    pub fn capture(state: &GameState, fall_duration_ms: u32) -> Self {
        Self {
            tick: state.tick,
            score: state.score(),
            distance: state.distance(),
            lives: state.lives(),
            car_lane: state.car_lane(),
            paused: state.is_paused(),
            obstacles: state
                .obstacles()
                .map(|o| ObstacleView {
                    id: o.id,
                    kind: o.kind,
                    lane: o.lane,
                    progress: o.progress(fall_duration_ms),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Mode;

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_string(&RunCommand::MoveLeft).unwrap();
        assert_eq!(json, r#"{"type":"move_left"}"#);
        let back: RunCommand = serde_json::from_str(r#"{"type":"pause"}"#).unwrap();
        assert_eq!(back, RunCommand::Pause);
    }

    #[test]
    fn test_command_intents() {
        assert_eq!(RunCommand::MoveRight.intent(), Some(Intent::MoveRight));
        assert_eq!(RunCommand::Stop.intent(), None);
        assert_eq!(RunCommand::from(Intent::MoveLeft), RunCommand::MoveLeft);
    }

    #[test]
    fn test_capture() {
        let mut state = GameState::default();
        state.start("alice", Mode::Normal, 1).unwrap();
        let id = state.spawn_obstacle(ObstacleKind::Coin, 4);
        state.obstacles.get_mut(&id).unwrap().elapsed_ms = 1250;

        let snapshot = RunSnapshot::capture(&state, 2500);
        assert_eq!(snapshot.lives, 3);
        assert_eq!(snapshot.car_lane, 2);
        assert_eq!(
            snapshot.obstacles,
            vec![ObstacleView { id, kind: ObstacleKind::Coin, lane: 4, progress: 0.5 }]
        );
    }
}

//! Obstacle Motion and Lifetime
//!
//! Obstacles fall linearly over a fixed duration. Expired obstacles are
//! collected first and removed in a second pass, so the live set is never
//! mutated while it is being walked.

use crate::game::events::GameEvent;
use crate::game::state::{GameState, Obstacle, ObstacleKind};

/// Default time for an obstacle to cross the playfield.
pub const DEFAULT_FALL_DURATION_MS: u32 = 2500;

/// Advance one obstacle and return its new progress.
#[inline]
pub fn advance(obstacle: &mut Obstacle, elapsed_ms: u32, fall_duration_ms: u32) -> f32 {
    obstacle.elapsed_ms = obstacle
        .elapsed_ms
        .saturating_add(elapsed_ms)
        .min(fall_duration_ms);
    obstacle.progress(fall_duration_ms)
}

/// Advance every live obstacle. Returns the ids that reached the bottom.
pub fn advance_all(state: &mut GameState, elapsed_ms: u32, fall_duration_ms: u32) -> Vec<u32> {
    let mut expired = Vec::new();
    for (id, obstacle) in state.obstacles.iter_mut() {
        advance(obstacle, elapsed_ms, fall_duration_ms);
        if obstacle.is_expired(fall_duration_ms) {
            expired.push(*id);
        }
    }
    expired
}

/// Remove expired obstacles.
///
/// Each rock leaving the playfield was avoided and emits `RockAvoided`;
/// `rock_avoid_bonus` points are awarded for it when non-zero.
pub fn remove_expired(state: &mut GameState, expired: &[u32], rock_avoid_bonus: u32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for &id in expired {
        let Some(obstacle) = state.remove_obstacle(id) else {
            continue;
        };
        if obstacle.kind == ObstacleKind::Rock && !obstacle.consumed {
            if rock_avoid_bonus > 0 {
                state.add_score(rock_avoid_bonus);
            }
            events.push(GameEvent::rock_avoided(state.tick, id, rock_avoid_bonus));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Mode;

    fn running_state() -> GameState {
        let mut state = GameState::default();
        state.start("alice", Mode::Normal, 1).unwrap();
        state
    }

    #[test]
    fn test_advance_is_linear_and_capped() {
        let mut obstacle = Obstacle::new(0, ObstacleKind::Rock, 0);
        assert_eq!(advance(&mut obstacle, 1250, 2500), 0.5);
        assert_eq!(advance(&mut obstacle, 625, 2500), 0.75);
        assert_eq!(advance(&mut obstacle, 10_000, 2500), 1.0);
        assert!(obstacle.is_expired(2500));
    }

    #[test]
    fn test_expired_obstacles_removed() {
        let mut state = running_state();
        state.spawn_obstacle(ObstacleKind::Coin, 0);
        let expired = advance_all(&mut state, 2000, 2500);
        assert!(expired.is_empty());

        state.spawn_obstacle(ObstacleKind::Rock, 1);
        let expired = advance_all(&mut state, 500, 2500);
        assert_eq!(expired, vec![0]);

        remove_expired(&mut state, &expired, 0);
        assert_eq!(state.obstacle_count(), 1);
        assert!(state.obstacle(0).is_none());
    }

    #[test]
    fn test_avoided_rock_scores_once() {
        let mut state = running_state();
        let id = state.spawn_obstacle(ObstacleKind::Rock, 4);
        let expired = advance_all(&mut state, 2500, 2500);

        let events = remove_expired(&mut state, &expired, 10);
        assert_eq!(events, vec![GameEvent::rock_avoided(state.tick, id, 10)]);
        assert_eq!(state.score(), 10);

        // Removing again does nothing
        assert!(remove_expired(&mut state, &expired, 10).is_empty());
        assert_eq!(state.score(), 10);
    }

    #[test]
    fn test_no_bonus_by_default() {
        let mut state = running_state();
        state.spawn_obstacle(ObstacleKind::Rock, 4);
        let expired = advance_all(&mut state, 2500, 2500);
        let events = remove_expired(&mut state, &expired, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(state.score(), 0);
    }
}

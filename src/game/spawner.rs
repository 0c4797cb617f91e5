//! Obstacle Spawning
//!
//! Weighted-random obstacle typing and uniform lane choice, driven by the run
//! RNG so spawns are reproducible from the seed.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::state::{GameState, ObstacleKind};

/// Percent chance (out of 100) a heart spawns while a life is missing.
pub const DEFAULT_HEART_CHANCE: u32 = 8;

/// Percent chance (out of 100) a coin spawns.
pub const DEFAULT_COIN_CHANCE: u32 = 30;

/// Spawn probability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Heart chance in percent, only rolled when `lives < max_lives`
    pub heart_chance: u32,
    /// Coin chance in percent (0 gives a rocks-only table)
    pub coin_chance: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            heart_chance: DEFAULT_HEART_CHANCE,
            coin_chance: DEFAULT_COIN_CHANCE,
        }
    }
}

/// Pick an obstacle kind. First match wins: heart, then coin, then rock.
///
/// The heart draw is only consumed when a life is missing; the coin draw is
/// always independent of it.
pub fn choose_kind(
    rng: &mut DeterministicRng,
    lives: u8,
    max_lives: u8,
    config: &SpawnConfig,
) -> ObstacleKind {
    if lives < max_lives && rng.roll_percent() < config.heart_chance {
        return ObstacleKind::Heart;
    }
    if rng.roll_percent() < config.coin_chance {
        ObstacleKind::Coin
    } else {
        ObstacleKind::Rock
    }
}

/// Spawn one obstacle at the top of a random lane.
///
/// Returns the new obstacle id, or `None` when the run is not live.
pub fn spawn(state: &mut GameState, config: &SpawnConfig) -> Option<u32> {
    if !state.is_active() {
        return None;
    }

    let lane_count = state.lanes().lane_count() as u32;
    let lane = state.rng.next_int(lane_count) as u8;
    let (lives, max_lives) = (state.lives(), state.max_lives());
    let kind = choose_kind(&mut state.rng, lives, max_lives, config);

    Some(state.spawn_obstacle(kind, lane))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::lane::LaneModel;
    use crate::game::state::Mode;
    use std::collections::BTreeMap;

    fn running_state(seed: u64) -> GameState {
        let mut state = GameState::default();
        state.start("alice", Mode::Normal, seed).unwrap();
        state.take_events();
        state
    }

    #[test]
    fn test_spawn_determinism() {
        let mut a = running_state(12345);
        let mut b = running_state(12345);
        let config = SpawnConfig::default();

        for _ in 0..50 {
            spawn(&mut a, &config);
            spawn(&mut b, &config);
        }

        assert_eq!(a.obstacle_count(), 50);
        for (x, y) in a.obstacles().zip(b.obstacles()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_no_spawn_unless_running() {
        let mut state = GameState::default();
        assert!(spawn(&mut state, &SpawnConfig::default()).is_none());

        let mut state = running_state(1);
        state.pause();
        assert!(spawn(&mut state, &SpawnConfig::default()).is_none());
        assert_eq!(state.obstacle_count(), 0);
    }

    #[test]
    fn test_no_hearts_at_full_lives() {
        let mut rng = DeterministicRng::new(99);
        let config = SpawnConfig::default();
        for _ in 0..2000 {
            assert_ne!(choose_kind(&mut rng, 3, 3, &config), ObstacleKind::Heart);
        }
    }

    #[test]
    fn test_rocks_only_table() {
        let mut rng = DeterministicRng::new(5);
        let config = SpawnConfig { heart_chance: 0, coin_chance: 0 };
        for _ in 0..500 {
            assert_eq!(choose_kind(&mut rng, 1, 3, &config), ObstacleKind::Rock);
        }
    }

    #[test]
    fn test_distribution_roughly_matches_table() {
        let mut rng = DeterministicRng::new(2024);
        let config = SpawnConfig::default();
        let mut counts: BTreeMap<ObstacleKind, u32> = BTreeMap::new();

        for _ in 0..10_000 {
            *counts.entry(choose_kind(&mut rng, 3, 3, &config)).or_default() += 1;
        }

        let coins = counts.get(&ObstacleKind::Coin).copied().unwrap_or(0);
        assert!((2_500..3_500).contains(&coins), "coins: {coins}");
    }

    #[test]
    fn test_lanes_in_range() {
        let mut state = GameState::new(LaneModel::even(3).unwrap(), 3);
        state.start("bob", Mode::Fast, 77).unwrap();
        for _ in 0..200 {
            spawn(&mut state, &SpawnConfig::default());
        }
        assert!(state.obstacles().all(|o| o.lane < 3));
    }

    #[test]
    fn test_spawn_emits_event() {
        let mut state = running_state(3);
        let id = spawn(&mut state, &SpawnConfig::default()).unwrap();
        let events = state.take_events();
        assert!(matches!(
            events[0].data,
            GameEventData::ObstacleSpawned { obstacle_id, .. } if obstacle_id == id
        ));
    }
}

//! Simulation Ticks
//!
//! The three periodic activities of a run: spawn, physics and distance.
//! Every tick is deterministic given the state (and its RNG), so a run can be
//! replayed from its seed and recorded intents.

use serde::{Serialize, Deserialize};
use thiserror::Error;
#[cfg(feature = "debug-tracing")]
use tracing::debug;

use crate::game::collision::{check_all_collisions, Collision, Playfield};
use crate::game::events::GameEvent;
use crate::game::input::TimedIntent;
use crate::game::motion::{advance_all, remove_expired, DEFAULT_FALL_DURATION_MS};
use crate::game::spawner::{spawn, SpawnConfig};
use crate::game::state::{GameState, ObstacleKind};

/// Default physics/collision tick interval.
pub const DEFAULT_PHYSICS_TICK_MS: u32 = 50;

/// Default distance tick interval.
pub const DEFAULT_DISTANCE_TICK_MS: u32 = 1000;

/// Default distance added per distance tick.
pub const DEFAULT_DISTANCE_STEP: u32 = 10;

/// Default coin bonus.
pub const DEFAULT_COIN_BONUS: u32 = 50;

/// Errors that halt the tick loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// State failed its post-tick consistency check.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Collisions resolved this tick, in obstacle id order
    pub collisions: Vec<Collision>,
    /// Whether the run ended this tick
    pub run_ended: bool,
}

/// Simulation rules for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Spawn probability table
    pub spawn: SpawnConfig,
    /// Playfield geometry
    pub playfield: Playfield,
    /// Time for an obstacle to cross the playfield
    pub fall_duration_ms: u32,
    /// Physics/collision tick interval
    pub physics_tick_ms: u32,
    /// Distance tick interval
    pub distance_tick_ms: u32,
    /// Distance added per distance tick
    pub distance_step: u32,
    /// Points for a coin
    pub coin_bonus: u32,
    /// Points for a rock leaving the playfield (0 disables)
    pub rock_avoid_bonus: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            spawn: SpawnConfig::default(),
            playfield: Playfield::default(),
            fall_duration_ms: DEFAULT_FALL_DURATION_MS,
            physics_tick_ms: DEFAULT_PHYSICS_TICK_MS,
            distance_tick_ms: DEFAULT_DISTANCE_TICK_MS,
            distance_step: DEFAULT_DISTANCE_STEP,
            coin_bonus: DEFAULT_COIN_BONUS,
            rock_avoid_bonus: 0,
        }
    }
}

// =============================================================================
// TICKS
// =============================================================================

/// Spawn tick: add one obstacle.
pub fn spawn_tick(state: &mut GameState, config: &RunConfig) -> TickResult {
    if !state.is_active() {
        return TickResult::default();
    }
    spawn(state, &config.spawn);
    TickResult {
        events: state.take_events(),
        ..TickResult::default()
    }
}

/// Distance tick: add one distance step.
pub fn distance_tick(state: &mut GameState, config: &RunConfig) -> TickResult {
    if state.is_active() {
        state.add_distance(config.distance_step);
    }
    TickResult::default()
}

/// Physics tick: advance obstacles, resolve collisions, then apply the
/// terminal condition once every outcome of the tick is in.
pub fn physics_tick(state: &mut GameState, config: &RunConfig) -> Result<TickResult, TickError> {
    let mut result = TickResult::default();
    if !state.is_active() {
        return Ok(result);
    }

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Move obstacles, retire the ones that left the playfield
    let expired = advance_all(state, config.physics_tick_ms, config.fall_duration_ms);
    for event in remove_expired(state, &expired, config.rock_avoid_bonus) {
        state.push_event(event);
    }

    // 2. Detect and resolve collisions
    let collisions = check_all_collisions(state, &config.playfield, config.fall_duration_ms);
    for collision in &collisions {
        resolve_collision(state, collision, config);
    }
    result.collisions = collisions;

    // 3. Terminal condition
    result.run_ended = state.check_terminal();

    // 4. Consistency
    if let Some(violation) = state.invariant_violation() {
        return Err(TickError::InvariantViolation(violation));
    }

    #[cfg(feature = "debug-tracing")]
    debug!(
        tick = state.tick,
        obstacles = state.obstacle_count(),
        lives = state.lives(),
        score = state.score(),
        "physics tick"
    );

    result.events = state.take_events();
    Ok(result)
}

/// Apply one collision outcome. The obstacle is consumed and removed.
fn resolve_collision(state: &mut GameState, collision: &Collision, config: &RunConfig) {
    let Some(mut obstacle) = state.remove_obstacle(collision.obstacle_id) else {
        return;
    };
    if obstacle.consumed {
        return;
    }
    obstacle.consumed = true;

    let tick = state.tick;
    match obstacle.kind {
        ObstacleKind::Rock => {
            state.push_event(GameEvent::crashed(tick, obstacle.id, obstacle.lane));
            state.reduce_life();
        }
        ObstacleKind::Coin => {
            state.add_score(config.coin_bonus);
            let event = GameEvent::coin_collected(tick, obstacle.id, config.coin_bonus, state.score());
            state.push_event(event);
        }
        ObstacleKind::Heart => {
            state.add_life();
            let event = GameEvent::life_gained(tick, obstacle.id, state.lives());
            state.push_event(event);
        }
    }
}

// =============================================================================
// REPLAY
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Activity {
    Physics,
    Spawn,
    Distance,
    Input,
}

/// Replay a run in virtual time from recorded intents.
///
/// `state` must already be running. Every activity fires at time zero and then
/// on its interval; at equal times physics runs first, then spawn, distance
/// and finally any intents due. Stops at `duration_ms` or when the run ends.
pub fn replay_run(
    initial_state: GameState,
    config: &RunConfig,
    intents: &[TimedIntent],
    duration_ms: u64,
) -> Result<(GameState, Vec<GameEvent>), TickError> {
    let mut state = initial_state;
    let mut all_events = state.take_events();

    let physics_every = config.physics_tick_ms.max(1) as u64;
    let spawn_every = state.cadence_ms().max(1) as u64;
    let distance_every = config.distance_tick_ms.max(1) as u64;

    let mut next_physics = 0u64;
    let mut next_spawn = 0u64;
    let mut next_distance = 0u64;
    let mut next_intent = 0usize;

    while state.is_running() {
        let mut due = vec![
            (next_physics, Activity::Physics),
            (next_spawn, Activity::Spawn),
            (next_distance, Activity::Distance),
        ];
        if let Some(intent) = intents.get(next_intent) {
            due.push((intent.at_ms, Activity::Input));
        }
        let Some(&(now, activity)) = due.iter().min() else {
            break;
        };
        if now > duration_ms {
            break;
        }

        match activity {
            Activity::Physics => {
                let result = physics_tick(&mut state, config)?;
                all_events.extend(result.events);
                next_physics += physics_every;
            }
            Activity::Spawn => {
                all_events.extend(spawn_tick(&mut state, config).events);
                next_spawn += spawn_every;
            }
            Activity::Distance => {
                distance_tick(&mut state, config);
                next_distance += distance_every;
            }
            Activity::Input => {
                state.apply_intent(intents[next_intent].intent);
                next_intent += 1;
            }
        }
    }

    all_events.extend(state.take_events());
    Ok((state, all_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::input::Intent;
    use crate::game::lane::LaneModel;
    use crate::game::state::{Mode, RunPhase};

    /// Elapsed time that puts an obstacle level with the car after one more tick.
    const NEAR_CAR: u32 = 2050;

    fn running_state(lanes: LaneModel, seed: u64) -> GameState {
        let mut state = GameState::new(lanes, 3);
        state.start("alice", Mode::Normal, seed).unwrap();
        state.take_events();
        state
    }

    fn place(state: &mut GameState, kind: ObstacleKind, lane: u8, elapsed_ms: u32) -> u32 {
        let id = state.spawn_obstacle(kind, lane);
        state.obstacles.get_mut(&id).unwrap().elapsed_ms = elapsed_ms;
        state.take_events();
        id
    }

    #[test]
    fn test_rock_in_lane_costs_one_life() {
        let mut state = running_state(LaneModel::even(3).unwrap(), 1);
        let lane = state.car_lane();
        let id = place(&mut state, ObstacleKind::Rock, lane, NEAR_CAR);

        let result = physics_tick(&mut state, &RunConfig::default()).unwrap();

        assert_eq!(state.lives(), 2);
        assert!(state.obstacle(id).is_none());
        assert!(state.is_running());
        assert!(!result.run_ended);
        assert!(result.events.iter().any(|e| e.is_crash()));
    }

    #[test]
    fn test_heart_at_full_lives() {
        let mut state = running_state(LaneModel::default(), 1);
        let lane = state.car_lane();
        let id = place(&mut state, ObstacleKind::Heart, lane, NEAR_CAR);

        let result = physics_tick(&mut state, &RunConfig::default()).unwrap();

        assert_eq!(state.lives(), 3);
        assert!(state.obstacle(id).is_none());
        assert_eq!(result.collisions.len(), 1);
    }

    #[test]
    fn test_coin_scores_once() {
        let mut state = running_state(LaneModel::default(), 1);
        let lane = state.car_lane();
        place(&mut state, ObstacleKind::Coin, lane, NEAR_CAR);
        let config = RunConfig::default();

        physics_tick(&mut state, &config).unwrap();
        physics_tick(&mut state, &config).unwrap();

        assert_eq!(state.score(), 50);
    }

    #[test]
    fn test_three_rocks_end_run() {
        let mut state = running_state(LaneModel::default(), 1);
        let lane = state.car_lane();
        for _ in 0..3 {
            place(&mut state, ObstacleKind::Rock, lane, NEAR_CAR);
        }

        let result = physics_tick(&mut state, &RunConfig::default()).unwrap();

        assert!(result.run_ended);
        assert_eq!(result.collisions.len(), 3);
        assert_eq!(state.lives(), 0);
        assert_eq!(state.phase(), RunPhase::GameOver);
        assert!(state.awaiting_record());

        // Frozen afterwards
        let result = physics_tick(&mut state, &RunConfig::default()).unwrap();
        assert!(result.events.is_empty());
        assert!(!result.run_ended);
    }

    #[test]
    fn test_terminal_check_after_all_outcomes() {
        let mut state = running_state(LaneModel::default(), 1);
        state.reduce_life();
        state.reduce_life();
        let lane = state.car_lane();
        // Rock (lower id) resolves first, the heart in the same tick saves the run
        place(&mut state, ObstacleKind::Rock, lane, NEAR_CAR);
        place(&mut state, ObstacleKind::Heart, lane, NEAR_CAR);

        let result = physics_tick(&mut state, &RunConfig::default()).unwrap();

        assert!(!result.run_ended);
        assert_eq!(state.lives(), 1);
        assert!(state.is_running());
    }

    #[test]
    fn test_avoided_rocks_expire() {
        let mut state = running_state(LaneModel::default(), 1);
        let id = place(&mut state, ObstacleKind::Rock, 0, 2490);
        let config = RunConfig { rock_avoid_bonus: 10, ..RunConfig::default() };

        let result = physics_tick(&mut state, &config).unwrap();

        assert!(state.obstacle(id).is_none());
        assert_eq!(state.score(), 10);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::RockAvoided { obstacle_id, .. } if obstacle_id == id)));
    }

    #[test]
    fn test_ticks_inert_while_paused() {
        let mut state = running_state(LaneModel::default(), 1);
        place(&mut state, ObstacleKind::Rock, 0, 0);
        state.pause();
        let config = RunConfig::default();

        physics_tick(&mut state, &config).unwrap();
        spawn_tick(&mut state, &config);
        distance_tick(&mut state, &config);

        assert_eq!(state.tick, 0);
        assert_eq!(state.obstacle_count(), 1);
        assert_eq!(state.distance(), 0);
    }

    #[test]
    fn test_distance_tick() {
        let mut state = running_state(LaneModel::default(), 1);
        let config = RunConfig::default();
        for _ in 0..5 {
            distance_tick(&mut state, &config);
        }
        assert_eq!(state.distance(), 50);
    }

    #[test]
    fn test_invariant_violation_reported() {
        let mut state = running_state(LaneModel::default(), 1);
        place(&mut state, ObstacleKind::Coin, 0, 0);
        state.obstacles.get_mut(&0).unwrap().lane = 9;

        let err = physics_tick(&mut state, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, TickError::InvariantViolation(_)));
    }

    #[test]
    fn test_tick_determinism() {
        let config = RunConfig::default();
        let mut a = running_state(LaneModel::default(), 12345);
        let mut b = running_state(LaneModel::default(), 12345);

        for t in 0..400u32 {
            if t % 20 == 0 {
                spawn_tick(&mut a, &config);
                spawn_tick(&mut b, &config);
            }
            if t % 7 == 0 {
                a.move_right();
                b.move_right();
            }
            if t % 11 == 0 {
                a.move_left();
                b.move_left();
            }
            physics_tick(&mut a, &config).unwrap();
            physics_tick(&mut b, &config).unwrap();
        }

        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.lives(), b.lives());
    }

    #[test]
    fn test_replay_determinism() {
        let config = RunConfig::default();
        let intents: Vec<TimedIntent> = (0..60)
            .map(|i| {
                let intent = if i % 3 == 0 { Intent::MoveLeft } else { Intent::MoveRight };
                TimedIntent::new(i * 450 + 25, intent)
            })
            .collect();

        let (final1, events1) =
            replay_run(running_state(LaneModel::default(), 99999), &config, &intents, 30_000).unwrap();
        let (final2, events2) =
            replay_run(running_state(LaneModel::default(), 99999), &config, &intents, 30_000).unwrap();

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(events1, events2);

        let (other, _) =
            replay_run(running_state(LaneModel::default(), 1), &config, &intents, 30_000).unwrap();
        assert_ne!(final1.compute_hash(), other.compute_hash());
    }

    #[test]
    fn test_replay_fires_everything_at_start() {
        let config = RunConfig::default();
        let (state, events) =
            replay_run(running_state(LaneModel::default(), 5), &config, &[], 0).unwrap();

        assert_eq!(state.tick, 1);
        assert_eq!(state.distance(), 10);
        assert_eq!(state.obstacle_count(), 1);
        assert!(matches!(events[0].data, GameEventData::ObstacleSpawned { .. }));
    }
}

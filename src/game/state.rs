//! Game State Definitions
//!
//! All state types for run simulation.
//! Uses BTreeMap for deterministic iteration order over obstacles.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::events::GameEvent;
use crate::game::input::Intent;
use crate::game::lane::LaneModel;
use crate::persistence::leaderboard::{GeoPoint, HighScoreRecord};
use crate::DEFAULT_MAX_LIVES;

// =============================================================================
// RUN PHASE & MODE
// =============================================================================

/// Run state machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting for a player name and mode
    Menu,
    /// Ticks are live
    Running,
    /// Run ended; state is frozen
    GameOver,
}

impl RunPhase {
    fn as_u8(self) -> u8 {
        match self {
            RunPhase::Menu => 0,
            RunPhase::Running => 1,
            RunPhase::GameOver => 2,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Menu => "menu",
            RunPhase::Running => "running",
            RunPhase::GameOver => "game-over",
        };
        f.write_str(name)
    }
}

/// Difficulty mode. Each mode fixes the spawn cadence for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Mode {
    /// 1500 ms between spawns
    Slow,
    /// 1000 ms between spawns
    #[default]
    Normal,
    /// 1200 ms between spawns (tilt-controlled play)
    Tilt,
    /// 800 ms between spawns
    Fast,
}

impl Mode {
    /// Spawn cadence in milliseconds.
    pub fn cadence_ms(self) -> u32 {
        match self {
            Mode::Slow => 1500,
            Mode::Normal => 1000,
            Mode::Tilt => 1200,
            Mode::Fast => 800,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Slow => "slow",
            Mode::Normal => "normal",
            Mode::Tilt => "tilt",
            Mode::Fast => "fast",
        }
    }
}

impl FromStr for Mode {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slow" => Ok(Mode::Slow),
            "normal" => Ok(Mode::Normal),
            "tilt" | "sensor" => Ok(Mode::Tilt),
            "fast" => Ok(Mode::Fast),
            other => Err(RunError::UnknownMode(other.to_string())),
        }
    }
}

// =============================================================================
// OBSTACLES
// =============================================================================

/// Kind of falling obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObstacleKind {
    /// Costs a life on contact
    Rock = 0,
    /// Grants bonus points on contact
    Coin = 1,
    /// Restores a life on contact
    Heart = 2,
}

/// A falling obstacle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique id within the run (spawn order)
    pub id: u32,
    /// Obstacle kind
    pub kind: ObstacleKind,
    /// Lane index
    pub lane: u8,
    /// Milliseconds fallen so far
    pub elapsed_ms: u32,
    /// Set once resolved by a collision
    pub consumed: bool,
}

impl Obstacle {
    /// Create an obstacle at the top of the playfield.
    pub fn new(id: u32, kind: ObstacleKind, lane: u8) -> Self {
        Self {
            id,
            kind,
            lane,
            elapsed_ms: 0,
            consumed: false,
        }
    }

    /// Vertical progress in [0, 1] for a given fall duration.
    pub fn progress(&self, fall_duration_ms: u32) -> f32 {
        if fall_duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f32 / fall_duration_ms as f32).min(1.0)
    }

    /// True once the obstacle has fallen the full duration.
    #[inline]
    pub fn is_expired(&self, fall_duration_ms: u32) -> bool {
        self.elapsed_ms >= fall_duration_ms
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors surfaced by state machine transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Player name missing or blank.
    #[error("Enter Name!")]
    EmptyName,

    /// Transition not allowed from the current phase.
    #[error("cannot {action} while in {from}")]
    InvalidTransition {
        /// Phase the state machine was in
        from: RunPhase,
        /// Requested transition
        action: &'static str,
    },

    /// Unrecognized difficulty name.
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a single run.
///
/// Score, distance, lives and phase are private: the mutators below are the
/// only way to change them, and all of them are inert outside `Running`.
#[derive(Clone, Debug)]
pub struct GameState {
    phase: RunPhase,
    paused: bool,
    aborted: bool,
    finalized: bool,

    score: u32,
    distance: u32,
    lives: u8,
    max_lives: u8,

    mode: Mode,
    cadence_ms: u32,
    player_name: String,

    lanes: LaneModel,
    car_lane: u8,

    /// Live obstacles (BTreeMap for deterministic order)
    pub(crate) obstacles: BTreeMap<u32, Obstacle>,

    /// Physics ticks elapsed this run
    pub tick: u32,

    /// Seed the RNG was created from
    pub rng_seed: u64,

    /// Run RNG
    pub(crate) rng: DeterministicRng,

    next_obstacle_id: u32,
    pending_events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh state sitting in the menu.
    pub fn new(lanes: LaneModel, max_lives: u8) -> Self {
        let car_lane = lanes.start_lane();
        Self {
            phase: RunPhase::Menu,
            paused: false,
            aborted: false,
            finalized: false,
            score: 0,
            distance: 0,
            lives: max_lives,
            max_lives,
            mode: Mode::default(),
            cadence_ms: Mode::default().cadence_ms(),
            player_name: String::new(),
            lanes,
            car_lane,
            obstacles: BTreeMap::new(),
            tick: 0,
            rng_seed: 0,
            rng: DeterministicRng::new(0),
            next_obstacle_id: 0,
            pending_events: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// True while ticks are live (paused runs still count as running).
    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// True while the run is paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when ticks should do work.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_running() && !self.paused
    }

    /// Terminal condition.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    /// Current score.
    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Distance travelled.
    #[inline]
    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// Remaining lives.
    #[inline]
    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Life cap.
    #[inline]
    pub fn max_lives(&self) -> u8 {
        self.max_lives
    }

    /// Selected mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Spawn cadence for this run.
    #[inline]
    pub fn cadence_ms(&self) -> u32 {
        self.cadence_ms
    }

    /// Player name (empty in the menu).
    #[inline]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Lane layout.
    #[inline]
    pub fn lanes(&self) -> &LaneModel {
        &self.lanes
    }

    /// Lane the car occupies.
    #[inline]
    pub fn car_lane(&self) -> u8 {
        self.car_lane
    }

    /// Live obstacles in id order.
    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// Number of live obstacles.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Look up a live obstacle.
    pub fn obstacle(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// True once the run ended abnormally (no record is produced).
    #[inline]
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    /// True when the run ended on lives and its record has not been produced.
    pub fn awaiting_record(&self) -> bool {
        self.phase == RunPhase::GameOver && !self.aborted && !self.finalized
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// `Menu --start(name, mode)--> Running`.
    ///
    /// A blank name is rejected and leaves the state untouched.
    pub fn start(&mut self, name: &str, mode: Mode, seed: u64) -> Result<(), RunError> {
        if self.phase != RunPhase::Menu {
            return Err(RunError::InvalidTransition {
                from: self.phase,
                action: "start",
            });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(RunError::EmptyName);
        }
        self.player_name = name.to_string();
        self.begin(mode, seed);
        Ok(())
    }

    /// `GameOver --replay--> Running`, keeping the player name.
    ///
    /// `mode` switches difficulty; `None` keeps the previous one.
    pub fn replay(&mut self, mode: Option<Mode>, seed: u64) -> Result<(), RunError> {
        if self.phase != RunPhase::GameOver {
            return Err(RunError::InvalidTransition {
                from: self.phase,
                action: "replay",
            });
        }
        self.begin(mode.unwrap_or(self.mode), seed);
        Ok(())
    }

    /// `GameOver --exit--> Menu`, clearing the player name.
    pub fn exit(&mut self) -> Result<(), RunError> {
        if self.phase != RunPhase::GameOver {
            return Err(RunError::InvalidTransition {
                from: self.phase,
                action: "exit",
            });
        }
        self.player_name.clear();
        self.set_phase(RunPhase::Menu);
        Ok(())
    }

    /// Quit a live run straight to the menu. No record is produced.
    pub fn stop(&mut self) -> Result<(), RunError> {
        if self.phase != RunPhase::Running {
            return Err(RunError::InvalidTransition {
                from: self.phase,
                action: "stop",
            });
        }
        self.paused = false;
        self.obstacles.clear();
        self.player_name.clear();
        self.set_phase(RunPhase::Menu);
        Ok(())
    }

    /// Defensive end of run after a failed tick. No record is produced.
    pub fn abort(&mut self) {
        if self.phase == RunPhase::Running {
            self.aborted = true;
            self.paused = false;
            self.set_phase(RunPhase::GameOver);
        }
    }

    /// Apply the terminal condition. Returns true if the run just ended.
    pub fn check_terminal(&mut self) -> bool {
        if self.phase == RunPhase::Running && self.is_dead() {
            self.paused = false;
            self.set_phase(RunPhase::GameOver);
            return true;
        }
        false
    }

    /// Pause a live run. Returns false if nothing changed.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    /// Resume a paused run. Returns false if nothing changed.
    pub fn resume(&mut self) -> bool {
        if !self.is_running() || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    /// Produce the run's leaderboard record, exactly once per run.
    pub fn finalize(&mut self, position: GeoPoint) -> Option<HighScoreRecord> {
        if !self.awaiting_record() {
            return None;
        }
        self.finalized = true;
        let record = HighScoreRecord::new(self.player_name.clone(), self.score, position);
        self.push_event(GameEvent::game_over(self.tick, record.clone(), self.distance));
        Some(record)
    }

    fn begin(&mut self, mode: Mode, seed: u64) {
        self.mode = mode;
        self.cadence_ms = mode.cadence_ms();
        self.score = 0;
        self.distance = 0;
        self.lives = self.max_lives;
        self.paused = false;
        self.aborted = false;
        self.finalized = false;
        self.car_lane = self.lanes.start_lane();
        self.obstacles.clear();
        self.next_obstacle_id = 0;
        self.tick = 0;
        self.rng_seed = seed;
        self.rng = DeterministicRng::new(seed);
        self.set_phase(RunPhase::Running);
    }

    fn set_phase(&mut self, new_phase: RunPhase) {
        let old_phase = self.phase;
        if old_phase != new_phase {
            self.phase = new_phase;
            self.push_event(GameEvent::phase_changed(self.tick, old_phase, new_phase));
        }
    }

    // -------------------------------------------------------------------------
    // Mutators (no-ops unless running)
    // -------------------------------------------------------------------------

    /// Add points.
    pub fn add_score(&mut self, points: u32) {
        if self.is_running() {
            self.score = self.score.saturating_add(points);
        }
    }

    /// Add distance.
    pub fn add_distance(&mut self, meters: u32) {
        if self.is_running() {
            self.distance = self.distance.saturating_add(meters);
        }
    }

    /// Lose a life, never going below zero.
    pub fn reduce_life(&mut self) {
        if self.is_running() && self.lives > 0 {
            self.lives -= 1;
            self.push_event(GameEvent::life_lost(self.tick, self.lives));
        }
    }

    /// Gain a life, never exceeding the cap.
    pub fn add_life(&mut self) {
        if self.is_running() && self.lives < self.max_lives {
            self.lives += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Move the car one lane left. No-op at the boundary.
    pub fn move_left(&mut self) -> bool {
        self.apply_intent(Intent::MoveLeft)
    }

    /// Move the car one lane right. No-op at the boundary.
    pub fn move_right(&mut self) -> bool {
        self.apply_intent(Intent::MoveRight)
    }

    /// Apply an input intent.
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        self.shift_car(intent.delta())
    }

    fn shift_car(&mut self, delta: i32) -> bool {
        if !self.is_active() {
            return false;
        }
        let target = self.lanes.clamp_lane(self.car_lane as i32 + delta);
        let moved = target != self.car_lane;
        self.car_lane = target;
        moved
    }

    // -------------------------------------------------------------------------
    // Obstacles
    // -------------------------------------------------------------------------

    /// Add an obstacle at the top of `lane`. Returns its id.
    pub fn spawn_obstacle(&mut self, kind: ObstacleKind, lane: u8) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        let lane = self.lanes.clamp_lane(lane as i32);
        self.obstacles.insert(id, Obstacle::new(id, kind, lane));
        self.push_event(GameEvent::obstacle_spawned(self.tick, id, kind, lane));
        id
    }

    /// Remove an obstacle from the live set.
    pub(crate) fn remove_obstacle(&mut self, id: u32) -> Option<Obstacle> {
        self.obstacles.remove(&id)
    }

    // -------------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------------

    /// Describe the first broken invariant, if any.
    pub fn invariant_violation(&self) -> Option<String> {
        if self.lives > self.max_lives {
            return Some(format!("lives {} above cap {}", self.lives, self.max_lives));
        }
        if self.is_running() && self.is_dead() {
            return Some("running with zero lives".to_string());
        }
        if !self.lanes.contains(self.car_lane) {
            return Some(format!("car in lane {} of {}", self.car_lane, self.lanes.lane_count()));
        }
        self.obstacles
            .values()
            .find(|o| !self.lanes.contains(o.lane) || o.consumed)
            .map(|o| format!("obstacle {} in lane {} (consumed: {})", o.id, o.lane, o.consumed))
    }

    /// Compute deterministic hash of current state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase.as_u8());
            hasher.update_bool(self.paused);
            hasher.update_u32(self.score);
            hasher.update_u32(self.distance);
            hasher.update_u8(self.lives);
            hasher.update_u8(self.car_lane);
            hasher.update_u32(self.cadence_ms);
            hasher.update_bytes(self.player_name.as_bytes());

            for (id, obstacle) in &self.obstacles {
                hasher.update_u32(*id);
                hasher.update_u8(obstacle.kind as u8);
                hasher.update_u8(obstacle.lane);
                hasher.update_u32(obstacle.elapsed_ms);
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(LaneModel::default(), DEFAULT_MAX_LIVES)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Collision Detection
//!
//! Deterministic car-vs-obstacle overlap tests in integer playfield units.
//! Detection is pure; resolution (score and life deltas) happens in the tick.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::game::lane::LaneModel;
use crate::game::state::{GameState, Obstacle, ObstacleKind};

// =============================================================================
// PLAYFIELD GEOMETRY
// =============================================================================

/// Logical playfield dimensions and hit-region sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playfield {
    /// Playfield width
    pub width: i32,
    /// Playfield height
    pub height: i32,
    /// Obstacle side length (obstacles are square)
    pub obstacle_size: i32,
    /// Obstacle hit-region inset
    pub obstacle_inset: i32,
    /// Distance above the playfield where obstacles enter
    pub entry_offset: i32,
    /// Extra travel below the playfield bottom before an obstacle expires
    pub exit_overshoot: i32,
    /// Car width
    pub car_width: i32,
    /// Car height
    pub car_height: i32,
    /// Gap between the car's bottom edge and the playfield bottom
    pub car_bottom_margin: i32,
    /// Car hit-region inset
    pub car_inset: i32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            obstacle_size: 120,
            obstacle_inset: 20,
            entry_offset: 150,
            exit_overshoot: 200,
            car_width: 150,
            car_height: 240,
            car_bottom_margin: 100,
            car_inset: 30,
        }
    }
}

impl Playfield {
    /// Inset hit region of the car in `lane`.
    pub fn car_rect(&self, lanes: &LaneModel, lane: u8) -> Rect {
        let top = self.height - self.car_bottom_margin - self.car_height;
        Rect::centered_x(lanes.lane_to_x(lane, self.width), top, self.car_width, self.car_height)
            .inset(self.car_inset)
    }

    /// Top edge of an obstacle after `elapsed_ms` of a `fall_duration_ms` fall.
    pub fn obstacle_top(&self, elapsed_ms: u32, fall_duration_ms: u32) -> i32 {
        let travel = (self.height + self.exit_overshoot) as i64;
        let offset = if fall_duration_ms == 0 {
            travel
        } else {
            travel * elapsed_ms.min(fall_duration_ms) as i64 / fall_duration_ms as i64
        };
        (offset - self.entry_offset as i64) as i32
    }

    /// Inset hit region of an obstacle.
    pub fn obstacle_rect(&self, lanes: &LaneModel, obstacle: &Obstacle, fall_duration_ms: u32) -> Rect {
        let top = self.obstacle_top(obstacle.elapsed_ms, fall_duration_ms);
        Rect::centered_x(
            lanes.lane_to_x(obstacle.lane, self.width),
            top,
            self.obstacle_size,
            self.obstacle_size,
        )
        .inset(self.obstacle_inset)
    }
}

// =============================================================================
// DETECTION
// =============================================================================

/// Hit region of one live obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleRegion {
    /// Obstacle id
    pub id: u32,
    /// Obstacle kind
    pub kind: ObstacleKind,
    /// Inset hit region
    pub rect: Rect,
}

/// A car-vs-obstacle overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Obstacle that was hit
    pub obstacle_id: u32,
    /// Its kind, which decides the outcome
    pub kind: ObstacleKind,
}

/// Test the car against every region. Output keeps the input order.
pub fn detect_overlaps(car: Rect, regions: &[ObstacleRegion]) -> Vec<Collision> {
    regions
        .iter()
        .filter(|region| car.intersects(&region.rect))
        .map(|region| Collision {
            obstacle_id: region.id,
            kind: region.kind,
        })
        .collect()
}

/// Hit regions of every unconsumed obstacle, ascending by id.
pub fn obstacle_regions(state: &GameState, playfield: &Playfield, fall_duration_ms: u32) -> Vec<ObstacleRegion> {
    state
        .obstacles()
        .filter(|o| !o.consumed)
        .map(|o| ObstacleRegion {
            id: o.id,
            kind: o.kind,
            rect: playfield.obstacle_rect(state.lanes(), o, fall_duration_ms),
        })
        .collect()
}

/// Check all car-vs-obstacle collisions in deterministic order.
pub fn check_all_collisions(state: &GameState, playfield: &Playfield, fall_duration_ms: u32) -> Vec<Collision> {
    let car = playfield.car_rect(state.lanes(), state.car_lane());
    detect_overlaps(car, &obstacle_regions(state, playfield, fall_duration_ms))
}

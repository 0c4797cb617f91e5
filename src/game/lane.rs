//! Lane Model
//!
//! Fixed discrete horizontal tracks. Positions are stored in per-mille of the
//! playfield width so lane geometry stays in integer space.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Per-mille scale (1000 = full playfield width).
pub const PER_MILLE: u32 = 1000;

/// Lane configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    /// Zero lanes requested.
    #[error("at least one lane is required")]
    NoLanes,

    /// Too many lanes to index with a u8.
    #[error("too many lanes: {0}")]
    TooManyLanes(usize),

    /// Explicit position outside [0, 1000].
    #[error("lane position {0}‰ is outside the playfield")]
    PositionOutOfRange(u16),
}

/// Lane layout for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneModel {
    /// Lane centres in per-mille of playfield width, left to right.
    positions: Vec<u16>,
}

impl LaneModel {
    /// Evenly spaced lanes: lane `i` of `n` sits at `(2i + 1) / 2n`.
    ///
    /// Five lanes give 0.1, 0.3, 0.5, 0.7, 0.9.
    pub fn even(lane_count: u8) -> Result<Self, LaneError> {
        if lane_count == 0 {
            return Err(LaneError::NoLanes);
        }
        let n = lane_count as u32;
        let positions = (0..n)
            .map(|i| ((2 * i + 1) * PER_MILLE / (2 * n)) as u16)
            .collect();
        Ok(Self { positions })
    }

    /// Explicitly spaced lanes (per-mille, left to right).
    pub fn with_positions(positions: &[u16]) -> Result<Self, LaneError> {
        if positions.is_empty() {
            return Err(LaneError::NoLanes);
        }
        if positions.len() > u8::MAX as usize {
            return Err(LaneError::TooManyLanes(positions.len()));
        }
        if let Some(bad) = positions.iter().find(|p| **p as u32 > PER_MILLE) {
            return Err(LaneError::PositionOutOfRange(*bad));
        }
        Ok(Self { positions: positions.to_vec() })
    }

    /// Number of lanes.
    #[inline]
    pub fn lane_count(&self) -> u8 {
        self.positions.len() as u8
    }

    /// Index of the last lane.
    #[inline]
    pub fn max_lane(&self) -> u8 {
        self.lane_count() - 1
    }

    /// Lane the car starts in (middle, rounding right for even counts).
    #[inline]
    pub fn start_lane(&self) -> u8 {
        self.lane_count() / 2
    }

    /// Normalized horizontal offset in [0, 1] of a lane centre.
    ///
    /// Out-of-range lanes are clamped first.
    pub fn lane_to_position(&self, lane: u8) -> f32 {
        self.per_mille(lane) as f32 / PER_MILLE as f32
    }

    /// Lane centre in logical units for a playfield of `width`.
    pub fn lane_to_x(&self, lane: u8, width: i32) -> i32 {
        (width as i64 * self.per_mille(lane) as i64 / PER_MILLE as i64) as i32
    }

    /// Restrict any lane index to `[0, lane_count - 1]`.
    #[inline]
    pub fn clamp_lane(&self, lane: i32) -> u8 {
        lane.clamp(0, self.max_lane() as i32) as u8
    }

    /// True if `lane` is a valid index.
    #[inline]
    pub fn contains(&self, lane: u8) -> bool {
        lane < self.lane_count()
    }

    fn per_mille(&self, lane: u8) -> u16 {
        self.positions[self.clamp_lane(lane as i32) as usize]
    }
}

impl Default for LaneModel {
    fn default() -> Self {
        Self {
            positions: vec![100, 300, 500, 700, 900],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_lanes_match_layout() {
        let lanes = LaneModel::even(5).unwrap();
        assert_eq!(lanes, LaneModel::default());
        assert_eq!(lanes.lane_to_position(0), 0.1);
        assert_eq!(lanes.lane_to_position(2), 0.5);
        assert_eq!(lanes.lane_to_position(4), 0.9);
        assert_eq!(lanes.start_lane(), 2);
    }

    #[test]
    fn test_three_lanes() {
        let lanes = LaneModel::even(3).unwrap();
        assert_eq!(lanes.lane_count(), 3);
        assert_eq!(lanes.start_lane(), 1);
        assert_eq!(lanes.lane_to_x(1, 1080), 540);
        assert!(lanes.lane_to_position(0) < lanes.lane_to_position(1));
        assert!(lanes.lane_to_position(1) < lanes.lane_to_position(2));
    }

    #[test]
    fn test_clamp_lane() {
        let lanes = LaneModel::even(3).unwrap();
        assert_eq!(lanes.clamp_lane(-1), 0);
        assert_eq!(lanes.clamp_lane(1), 1);
        assert_eq!(lanes.clamp_lane(7), 2);
    }

    #[test]
    fn test_positions_in_unit_range() {
        for n in 1..=9 {
            let lanes = LaneModel::even(n).unwrap();
            for lane in 0..n {
                let p = lanes.lane_to_position(lane);
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_invalid_layouts() {
        assert_eq!(LaneModel::even(0), Err(LaneError::NoLanes));
        assert_eq!(LaneModel::with_positions(&[]), Err(LaneError::NoLanes));
        assert_eq!(
            LaneModel::with_positions(&[200, 1200]),
            Err(LaneError::PositionOutOfRange(1200))
        );
    }
}

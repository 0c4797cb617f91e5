//! Tick Schedule
//!
//! The three intervals of one uninterrupted stretch of a run. Dropping the
//! schedule cancels all three at once; resuming builds a new one, so missed
//! ticks are never replayed.

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::game::tick::RunConfig;

/// Which periodic activity fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Motion and collisions
    Physics,
    /// New obstacle
    Spawn,
    /// Distance step
    Distance,
}

/// Live intervals for physics, spawn and distance ticks.
pub struct TickSchedule {
    physics: Interval,
    spawn: Interval,
    distance: Interval,
}

impl TickSchedule {
    /// Start all three intervals now. Each fires immediately, then on its period.
    pub fn start(config: &RunConfig, cadence_ms: u32) -> Self {
        Self {
            physics: periodic(config.physics_tick_ms),
            spawn: periodic(cadence_ms),
            distance: periodic(config.distance_tick_ms),
        }
    }

    /// Wait for the next due activity. Physics wins ties, then spawn.
    pub async fn next(&mut self) -> TickKind {
        tokio::select! {
            biased;
            _ = self.physics.tick() => TickKind::Physics,
            _ = self.spawn.tick() => TickKind::Spawn,
            _ = self.distance.tick() => TickKind::Distance,
        }
    }
}

fn periodic(period_ms: u32) -> Interval {
    let mut interval = interval(Duration::from_millis(period_ms.max(1) as u64));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_all_fire_immediately_in_order() {
        let mut schedule = TickSchedule::start(&RunConfig::default(), 1000);
        assert_eq!(schedule.next().await, TickKind::Physics);
        assert_eq!(schedule.next().await, TickKind::Spawn);
        assert_eq!(schedule.next().await, TickKind::Distance);
        assert_eq!(schedule.next().await, TickKind::Physics);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periods() {
        let mut schedule = TickSchedule::start(&RunConfig::default(), 800);
        let start = tokio::time::Instant::now();
        let mut spawns = 0;
        let mut distances = 0;
        let mut physics = 0;

        loop {
            let kind = schedule.next().await;
            if start.elapsed() >= Duration::from_millis(2000) {
                break;
            }
            match kind {
                TickKind::Physics => physics += 1,
                TickKind::Spawn => spawns += 1,
                TickKind::Distance => distances += 1,
            }
        }

        // 0, 800, 1600 | 0, 1000 | 0, 50, ..., 1950
        assert_eq!(spawns, 3);
        assert_eq!(distances, 2);
        assert_eq!(physics, 40);
    }
}

//! Feedback and Listeners
//!
//! Fire-and-forget notifications out of the run: player feedback (toasts,
//! haptics, sounds) and coarse lifecycle callbacks for the UI.

use tracing::{debug, info};

use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::{RunError, RunPhase};
use crate::persistence::leaderboard::HighScoreRecord;

/// Sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    /// Rock hit
    Crash,
}

/// Player-facing feedback sink.
pub trait Feedback: Send + Sync {
    /// Show a short message for an event.
    fn notify(&self, event: &GameEvent);
    /// Trigger a haptic pulse.
    fn vibrate(&self);
    /// Play a sound effect.
    fn play_sound(&self, sound: Sound);
}

/// Route one event to feedback. Crashes get the full treatment.
pub fn dispatch(feedback: &dyn Feedback, event: &GameEvent) {
    match &event.data {
        GameEventData::Crashed { .. } => {
            feedback.notify(event);
            feedback.vibrate();
            feedback.play_sound(Sound::Crash);
        }
        GameEventData::CoinCollected { .. }
        | GameEventData::LifeGained { .. }
        | GameEventData::LifeLost { .. }
        | GameEventData::GameOver { .. } => feedback.notify(event),
        _ => {}
    }
}

/// Lifecycle observer.
pub trait RunListener: Send + Sync {
    /// Phase changed.
    fn on_run_state_changed(&self, _phase: RunPhase) {}
    /// A run finished and its record was produced.
    fn on_game_over(&self, _record: &HighScoreRecord) {}
    /// A start or replay request was refused.
    fn on_rejected(&self, _error: &RunError) {}
}

/// Feedback that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn notify(&self, event: &GameEvent) {
        match &event.data {
            GameEventData::Crashed { lane, .. } => info!(tick = event.tick, lane, "Crash!"),
            GameEventData::CoinCollected { points, new_score, .. } => {
                info!(tick = event.tick, points, new_score, "Coin!")
            }
            GameEventData::LifeGained { lives, .. } => info!(tick = event.tick, lives, "Life!"),
            GameEventData::LifeLost { lives_left } => {
                info!(tick = event.tick, lives_left, "Life lost")
            }
            GameEventData::GameOver { record, distance } => {
                info!(name = %record.name, score = record.score, distance, "Game over")
            }
            other => debug!(tick = event.tick, ?other, "event"),
        }
    }

    fn vibrate(&self) {
        debug!("vibrate");
    }

    fn play_sound(&self, sound: Sound) {
        debug!(?sound, "sound");
    }
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RunListener for NoopListener {}

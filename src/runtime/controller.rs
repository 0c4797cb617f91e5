//! Run Controller
//!
//! Owns the `GameState` of one player and drives its three periodic ticks on a
//! single task. Commands arrive on an mpsc channel; snapshots go out on a
//! broadcast channel after every physics tick. When the run ends on lives the
//! controller resolves a position, persists the record and notifies listeners.
//!
//! This layer is **non-deterministic** (wall-clock scheduling, location I/O);
//! all simulation runs through `game/`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ConfigError, GameConfig};
use crate::core::rng::derive_run_seed;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::IntentLog;
use crate::game::state::{GameState, Mode, RunError};
use crate::game::tick::{distance_tick, physics_tick, spawn_tick};
use crate::persistence::leaderboard::{HighScoreRecord, Leaderboard};
use crate::persistence::store::ScoreStore;
use crate::runtime::feedback::{dispatch, Feedback, LogFeedback, NoopListener, RunListener};
use crate::runtime::location::{resolve_with_timeout, Locator, NoLocation};
use crate::runtime::protocol::{RunCommand, RunSnapshot};
use crate::runtime::schedule::{TickKind, TickSchedule};

/// Snapshot broadcast buffer.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// External collaborators of a run.
#[derive(Clone)]
pub struct Collaborators {
    /// Leaderboard persistence
    pub store: Arc<dyn ScoreStore>,
    /// Position source
    pub locator: Arc<dyn Locator>,
    /// Player feedback sink
    pub feedback: Arc<dyn Feedback>,
    /// Lifecycle observer
    pub listener: Arc<dyn RunListener>,
}

impl Collaborators {
    /// Collaborators with log feedback, no location and no listener.
    pub fn with_store(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            store,
            locator: Arc::new(NoLocation),
            feedback: Arc::new(LogFeedback),
            listener: Arc::new(NoopListener),
        }
    }
}

/// How a call to [`RunController::run`] finished.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Lives ran out; the record was produced (and handed to the store).
    Completed(HighScoreRecord),
    /// A tick failed; the run was ended without a record.
    Aborted,
    /// The player quit to the menu.
    Stopped,
}

/// Sending half of a controller's command channel.
#[derive(Debug, Clone)]
pub struct RunHandle {
    tx: mpsc::Sender<RunCommand>,
}

impl RunHandle {
    /// Create a command channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RunCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Send a command. Fails once the controller has gone away.
    pub async fn send(&self, command: RunCommand) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.tx.send(command).await
    }

    /// Car one lane left.
    pub async fn move_left(&self) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.send(RunCommand::MoveLeft).await
    }

    /// Car one lane right.
    pub async fn move_right(&self) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.send(RunCommand::MoveRight).await
    }

    /// Pause the run.
    pub async fn pause(&self) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.send(RunCommand::Pause).await
    }

    /// Resume the run.
    pub async fn resume(&self) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.send(RunCommand::Resume).await
    }

    /// Quit to the menu.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<RunCommand>> {
        self.send(RunCommand::Stop).await
    }
}

/// One iteration of the run loop.
enum Step {
    Tick(TickKind),
    Command(Option<RunCommand>),
}

/// Run-relative clock that stands still while paused.
struct RunClock {
    banked_ms: u64,
    since: Option<Instant>,
}

impl RunClock {
    fn started() -> Self {
        Self { banked_ms: 0, since: Some(Instant::now()) }
    }

    fn now_ms(&self) -> u64 {
        self.banked_ms + self.since.map_or(0, |t| t.elapsed().as_millis() as u64)
    }

    fn stop(&mut self) {
        self.banked_ms = self.now_ms();
        self.since = None;
    }

    fn resume(&mut self) {
        self.since = Some(Instant::now());
    }
}

/// Drives one player's runs.
pub struct RunController {
    config: GameConfig,
    state: GameState,
    collaborators: Collaborators,
    snapshot_tx: broadcast::Sender<RunSnapshot>,
    leaderboard: Leaderboard,
    intent_log: IntentLog,
    run_id: Uuid,
}

impl RunController {
    /// Create a controller sitting in the menu.
    pub fn new(config: GameConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;
        let lanes = config.lanes()?;
        let state = GameState::new(lanes, config.max_lives);
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

        let records = collaborators.store.load_all().unwrap_or_else(|e| {
            warn!(error = %e, "could not load leaderboard, starting empty");
            Vec::new()
        });
        let leaderboard = Leaderboard::from_records(records, config.leaderboard_size);

        Ok(Self {
            config,
            state,
            collaborators,
            snapshot_tx,
            leaderboard,
            intent_log: IntentLog::default(),
            run_id: Uuid::nil(),
        })
    }

    /// Subscribe to per-tick snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<RunSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state (read-only).
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Leaderboard as of the last load or save.
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Intents applied during the current (or last) run.
    pub fn intent_log(&self) -> &IntentLog {
        &self.intent_log
    }

    /// Id of the current (or last) run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Start a run from the menu with a fresh random seed.
    pub fn start(&mut self, name: &str, mode: Mode) -> Result<(), RunError> {
        let seed = derive_run_seed(name.trim(), rand::random());
        self.start_seeded(name, mode, seed)
    }

    /// Start a run from the menu with an explicit seed.
    pub fn start_seeded(&mut self, name: &str, mode: Mode, seed: u64) -> Result<(), RunError> {
        let started = self.state.start(name, mode, seed);
        self.check_request(started)?;
        self.begin_run(seed);
        Ok(())
    }

    /// Replay after game over, optionally switching mode.
    pub fn replay(&mut self, mode: Option<Mode>) -> Result<(), RunError> {
        let seed = derive_run_seed(self.state.player_name(), rand::random());
        self.replay_seeded(mode, seed)
    }

    /// Replay after game over with an explicit seed.
    pub fn replay_seeded(&mut self, mode: Option<Mode>, seed: u64) -> Result<(), RunError> {
        let replayed = self.state.replay(mode, seed);
        self.check_request(replayed)?;
        self.begin_run(seed);
        Ok(())
    }

    /// Leave game over for the menu.
    pub fn exit(&mut self) -> Result<(), RunError> {
        self.state.exit()?;
        self.drain_events();
        Ok(())
    }

    /// Refused requests go to the listener as well as the caller.
    fn check_request(&self, result: Result<(), RunError>) -> Result<(), RunError> {
        if let Err(e) = &result {
            warn!(error = %e, "run request rejected");
            self.collaborators.listener.on_rejected(e);
        }
        result
    }

    fn begin_run(&mut self, seed: u64) {
        self.run_id = Uuid::new_v4();
        self.intent_log = IntentLog::new(seed);
        info!(
            run_id = %self.run_id,
            player = %self.state.player_name(),
            mode = self.state.mode().as_str(),
            cadence_ms = self.state.cadence_ms(),
            seed,
            "run started"
        );
        self.drain_events();
    }

    // -------------------------------------------------------------------------
    // Run loop
    // -------------------------------------------------------------------------

    /// Drive the current run until it ends or the player quits.
    #[instrument(skip(self, commands), fields(run_id = %self.run_id))]
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<RunCommand>) -> Result<RunOutcome, RunError> {
        if !self.state.is_running() {
            return Err(RunError::InvalidTransition {
                from: self.state.phase(),
                action: "run",
            });
        }

        let mut clock = RunClock::started();
        let mut schedule = if self.state.is_paused() {
            clock.stop();
            None
        } else {
            Some(TickSchedule::start(&self.config.run, self.state.cadence_ms()))
        };
        let mut commands_open = true;

        loop {
            let step = match schedule.as_mut() {
                Some(schedule) => tokio::select! {
                    biased;
                    kind = schedule.next() => Step::Tick(kind),
                    command = commands.recv(), if commands_open => Step::Command(command),
                },
                None => Step::Command(commands.recv().await),
            };

            match step {
                Step::Tick(TickKind::Physics) => match physics_tick(&mut self.state, &self.config.run) {
                    Ok(result) => {
                        self.forward(&result.events);
                        let snapshot = RunSnapshot::capture(&self.state, self.config.run.fall_duration_ms);
                        let _ = self.snapshot_tx.send(snapshot);
                        if result.run_ended {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, tick = self.state.tick, "tick failed, ending run");
                        self.state.abort();
                        self.drain_events();
                        return Ok(RunOutcome::Aborted);
                    }
                },
                Step::Tick(TickKind::Spawn) => {
                    let result = spawn_tick(&mut self.state, &self.config.run);
                    self.forward(&result.events);
                }
                Step::Tick(TickKind::Distance) => {
                    distance_tick(&mut self.state, &self.config.run);
                }
                Step::Command(Some(command)) => {
                    if let Some(intent) = command.intent() {
                        if self.state.is_active() {
                            self.intent_log.record(clock.now_ms(), intent);
                            self.state.apply_intent(intent);
                        }
                        continue;
                    }
                    match command {
                        RunCommand::Pause => {
                            if self.state.pause() {
                                // Dropping the schedule cancels all three ticks
                                schedule = None;
                                clock.stop();
                                info!(tick = self.state.tick, "paused");
                            }
                        }
                        RunCommand::Resume => {
                            if self.state.resume() {
                                schedule = Some(TickSchedule::start(&self.config.run, self.state.cadence_ms()));
                                clock.resume();
                                info!(tick = self.state.tick, "resumed");
                            }
                        }
                        RunCommand::Stop => return Ok(self.stop_run()),
                        RunCommand::MoveLeft | RunCommand::MoveRight => {}
                    }
                }
                Step::Command(None) => {
                    commands_open = false;
                    if schedule.is_none() {
                        debug!("command channel closed while paused");
                        return Ok(self.stop_run());
                    }
                }
            }
        }

        drop(schedule);
        Ok(self.finish_run().await)
    }

    fn stop_run(&mut self) -> RunOutcome {
        if self.state.stop().is_ok() {
            info!(score = self.state.score(), distance = self.state.distance(), "run stopped");
        }
        self.drain_events();
        RunOutcome::Stopped
    }

    /// Resolve a position, produce the record, persist it, notify.
    async fn finish_run(&mut self) -> RunOutcome {
        let timeout = Duration::from_millis(self.config.location_timeout_ms);
        let mut position = resolve_with_timeout(self.collaborators.locator.as_ref(), timeout).await;
        if let Some(region) = &self.config.fallback {
            position = region.apply(position, &mut self.state.rng);
        }

        let Some(record) = self.state.finalize(position) else {
            warn!("run ended without a record");
            return RunOutcome::Aborted;
        };
        self.drain_events();

        let store = Arc::clone(&self.collaborators.store);
        let pending = record.clone();
        match tokio::task::spawn_blocking(move || store.save(pending)).await {
            Ok(Ok(records)) => {
                self.leaderboard = Leaderboard::from_records(records, self.config.leaderboard_size);
                info!(
                    score = record.score,
                    distance = self.state.distance(),
                    top_score = self.leaderboard.top_score(),
                    "score saved"
                );
            }
            Ok(Err(e)) => error!(error = %e, score = record.score, "failed to save score"),
            Err(e) => error!(error = %e, score = record.score, "score store worker failed"),
        }

        self.collaborators.listener.on_game_over(&record);
        RunOutcome::Completed(record)
    }

    fn drain_events(&mut self) {
        let events = self.state.take_events();
        self.forward(&events);
    }

    fn forward(&self, events: &[GameEvent]) {
        for event in events {
            if let GameEventData::PhaseChanged { new_phase, .. } = event.data {
                self.collaborators.listener.on_run_state_changed(new_phase);
            }
            dispatch(self.collaborators.feedback.as_ref(), event);
        }
    }
}

//! Super Lancer
//!
//! Headless demo: plays one run with a simple autopilot against the real
//! tick scheduler, saves the score and prints the leaderboard.
//!
//! Usage: `super-lancer [NAME] [slow|normal|tilt|fast]`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use super_lancer::{
    VERSION, Collaborators, GameConfig, JsonFileStore, Mode, RunController, RunHandle, RunOutcome,
    game::state::ObstacleKind,
    runtime::protocol::{RunCommand, RunSnapshot},
};

/// Rocks closer than this are dodged.
const THREAT_PROGRESS: f32 = 0.45;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Super Lancer v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "autopilot".to_string());
    let mode: Mode = match args.next() {
        Some(raw) => raw.parse()?,
        None => Mode::Normal,
    };

    let config = GameConfig::from_env().context("invalid configuration")?;
    let data_dir = std::env::var("SUPER_LANCER_DATA_DIR").unwrap_or_else(|_| ".".to_string());
    let demo_secs: u64 = std::env::var("SUPER_LANCER_DEMO_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);

    let store = Arc::new(JsonFileStore::in_dir(&data_dir, config.leaderboard_size));
    info!("Scores file: {}", store.path().display());
    info!(
        "Lanes: {}, lives: {}, cadence: {} ms",
        config.lane_count,
        config.max_lives,
        mode.cadence_ms()
    );

    let lane_count = config.lane_count;
    let mut controller = RunController::new(config, Collaborators::with_store(store))?;
    let (handle, mut commands) = RunHandle::channel(32);

    controller.start(&name, mode)?;
    info!("Run ID: {}", controller.run_id());

    let pilot = tokio::spawn(autopilot(controller.subscribe(), handle.clone(), lane_count));
    let deadline = {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(demo_secs)).await;
            warn!("Demo time limit reached");
            let _ = handle.stop().await;
        })
    };

    let outcome = controller.run(&mut commands).await?;
    deadline.abort();
    pilot.abort();

    info!("=== Run Results ===");
    match &outcome {
        RunOutcome::Completed(record) => info!(
            "{} scored {} over {} m at ({:.4}, {:.4})",
            record.name,
            record.score,
            controller.state().distance(),
            record.lat,
            record.lon
        ),
        RunOutcome::Stopped => info!(
            "Stopped with score {} over {} m",
            controller.state().score(),
            controller.state().distance()
        ),
        RunOutcome::Aborted => warn!("Run aborted"),
    }
    info!("Intents applied: {}", controller.intent_log().len());
    info!("Final State Hash: {}", hex::encode(controller.state().compute_hash()));

    info!("=== Leaderboard ===");
    for (rank, record) in controller.leaderboard().entries().iter().enumerate() {
        info!("#{}: {} - {}", rank + 1, record.name, record.score);
    }
    let focus = controller.leaderboard().focus();
    info!(
        "Map: {} markers, centred on ({:.4}, {:.4})",
        controller.leaderboard().markers().count(),
        focus.lat,
        focus.lon
    );

    Ok(())
}

/// Dodge rocks about to reach the car; drift toward coins and hearts otherwise.
async fn autopilot(mut snapshots: broadcast::Receiver<RunSnapshot>, handle: RunHandle, lane_count: u8) {
    loop {
        let snapshot = match snapshots.recv().await {
            Ok(snapshot) => snapshot,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        };
        if let Some(command) = choose_move(&snapshot, lane_count) {
            if handle.send(command).await.is_err() {
                return;
            }
        }
    }
}

fn choose_move(snapshot: &RunSnapshot, lane_count: u8) -> Option<RunCommand> {
    let threatened = |lane: u8| {
        snapshot
            .obstacles
            .iter()
            .any(|o| o.kind == ObstacleKind::Rock && o.lane == lane && o.progress >= THREAT_PROGRESS)
    };

    let lane = snapshot.car_lane;
    if threatened(lane) {
        let left = lane.checked_sub(1).filter(|l| !threatened(*l));
        let right = Some(lane + 1).filter(|l| *l < lane_count && !threatened(*l));
        return match (left, right) {
            (Some(_), Some(_)) if rand::random::<bool>() => Some(RunCommand::MoveLeft),
            (Some(_), Some(_)) => Some(RunCommand::MoveRight),
            (Some(_), None) => Some(RunCommand::MoveLeft),
            (None, Some(_)) => Some(RunCommand::MoveRight),
            (None, None) => None,
        };
    }

    // Chase the lowest pickup that is not behind a rock
    let target = snapshot
        .obstacles
        .iter()
        .filter(|o| o.kind != ObstacleKind::Rock && o.progress < 0.8)
        .max_by(|a, b| a.progress.total_cmp(&b.progress))?;
    if target.lane == lane {
        return None;
    }
    let (next, command) = if target.lane < lane {
        (lane - 1, RunCommand::MoveLeft)
    } else {
        (lane + 1, RunCommand::MoveRight)
    };
    (!threatened(next)).then_some(command)
}

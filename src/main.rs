use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde_json::json;
use sunshine_face::{
    BackgroundSet, FaceEvent, FaceRunner, Properties, RecordingCanvas, Rect, RunnerHost,
    SystemClock, TapType,
};
use sunshine_sync::{LoopbackChannel, WeatherBus, WeatherSyncListener};
use tokio_util::sync::CancellationToken;

/// Square surface of a typical round watch
const SURFACE: u32 = 320;

fn default_time_zone() -> Tz {
    std::env::var("TZ")
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    sunshine_core::init()?;

    // Create and initialize application
    let mut app = sunshine_core::App::new()?;
    app.initialize()?;
    let config = app.shared_config();

    tracing::info!(
        config_dir = %config.config_dir.display(),
        weather_path = %config.sync.weather_path,
        "Sunshine Wear host started"
    );

    // No decoded artwork in the headless host; real artwork goes through
    // BackgroundSet::new and a missing icon stops startup.
    let backgrounds = BackgroundSet::placeholder(SURFACE, SURFACE);

    let bus = WeatherBus::new();
    let shutdown = CancellationToken::new();

    let channel = LoopbackChannel::new();
    let batches = channel
        .take_batches()
        .context("sync channel batches already taken")?;
    let listener = WeatherSyncListener::new(channel.clone(), bus.clone(), &config.sync);
    let listener_task = tokio::spawn(listener.run(batches, shutdown.clone()));

    let host = Arc::new(RunnerHost::new(default_time_zone()));
    let (runner, face) = FaceRunner::new(
        config.face.clone(),
        backgrounds,
        &bus,
        host.clone(),
        Arc::new(SystemClock),
        RecordingCanvas::new(),
        Rect::from_size(SURFACE, SURFACE),
    )?;
    let face_task = tokio::spawn(runner.run(shutdown.clone()));

    // Lifecycle in the order a watch delivers it
    face.send(FaceEvent::Properties(Properties::default()));
    face.send(FaceEvent::Insets { is_round: true });
    face.send(FaceEvent::Surface {
        width: SURFACE,
        height: SURFACE,
    });
    face.send(FaceEvent::Visibility(true));

    channel
        .put_data_item(
            &config.sync.weather_path,
            json!({ "date": "Mon, Jun 1", "conditionId": 500, "high": "72°", "low": "58°" }),
        )
        .await?;

    tokio::time::sleep(Duration::from_millis(2_500)).await;

    face.send(FaceEvent::Tap {
        tap_type: TapType::Tap,
        x: 160,
        y: 160,
        event_time: 0,
    });
    face.send(FaceEvent::PeekCard(Rect::new(0, 250, 320, 320)));
    face.send(FaceEvent::Ambient(true));
    tokio::time::sleep(Duration::from_millis(200)).await;

    face.destroy();
    let canvas = face_task.await?;
    shutdown.cancel();
    listener_task.await?;

    tracing::info!(
        frames = canvas.frame_count(),
        redraws = host.invalidations(),
        last = ?canvas.last_texts(),
        "Watch face finished"
    );

    // Graceful shutdown
    app.shutdown()?;

    Ok(())
}

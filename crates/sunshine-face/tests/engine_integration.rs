//! Integration tests for the watch face runner.
//!
//! Time is paused so tick scheduling is deterministic.

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use serde_json::json;
use sunshine_core::{FaceConfig, SyncConfig};
use sunshine_face::{
    BackgroundSet, FaceEvent, FaceHandle, FaceRunner, ManualClock, ManualTickTimer,
    RecordingCanvas, Rect, RunnerHost, WatchFaceEngine,
};
use sunshine_sync::{LoopbackChannel, WeatherBus, WeatherSyncListener, TODAY_WEATHER_PATH};
use sunshine_weather::{BusMessage, WeatherSnapshot, DATA_EVENT};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// 2024-06-03 14:05:09.450 UTC
const NOW_MS: i64 = 1_717_423_509_450;

struct Face {
    handle: FaceHandle,
    host: Arc<RunnerHost>,
    shutdown: CancellationToken,
    task: JoinHandle<RecordingCanvas>,
}

fn spawn_face(bus: &WeatherBus) -> Face {
    let host = Arc::new(RunnerHost::new(Tz::UTC));
    let (runner, handle) = FaceRunner::new(
        FaceConfig::default(),
        BackgroundSet::placeholder(32, 32),
        bus,
        host.clone(),
        Arc::new(ManualClock::new(NOW_MS)),
        RecordingCanvas::new(),
        Rect::from_size(320, 320),
    )
    .unwrap();

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(runner.run(shutdown.clone()));
    Face {
        handle,
        host,
        shutdown,
        task,
    }
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_visible_face_ticks_until_ambient() {
    let bus = WeatherBus::new();
    let face = spawn_face(&bus);

    face.handle.send(FaceEvent::Visibility(true));
    // Ticks at 0, 550, 1100 and 1650 ms
    advance(2_000).await;
    let ticking = face.host.invalidations();
    assert_eq!(ticking, 4);

    face.handle.send(FaceEvent::Ambient(true));
    advance(10).await;
    assert_eq!(face.host.invalidations(), ticking + 1);

    // Repeated flag and idle time produce nothing
    face.handle.send(FaceEvent::Ambient(true));
    advance(5_000).await;
    assert_eq!(face.host.invalidations(), ticking + 1);

    assert!(face.handle.destroy());
    let canvas = face.task.await.unwrap();
    assert_eq!(canvas.frame_count(), ticking + 1);
    assert_eq!(canvas.last_texts(), vec!["14:05"]);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_face_never_ticks() {
    let bus = WeatherBus::new();
    let face = spawn_face(&bus);

    face.handle.send(FaceEvent::Visibility(true));
    advance(100).await;
    face.handle.send(FaceEvent::Visibility(false));
    advance(5_000).await;

    // Only the immediate tick on becoming visible
    assert_eq!(face.host.invalidations(), 1);
    assert!(!face.host.is_time_zone_registered());

    face.shutdown.cancel();
    face.task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_listener_snapshot_reaches_the_frame() {
    let bus = WeatherBus::new();
    let channel = LoopbackChannel::new();
    let batches = channel.take_batches().unwrap();
    let listener = WeatherSyncListener::new(channel.clone(), bus.clone(), &SyncConfig::default());
    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(listener.run(batches, shutdown.clone()));

    let face = spawn_face(&bus);
    face.handle.send(FaceEvent::Visibility(true));
    face.handle.send(FaceEvent::Ambient(true));
    advance(10).await;

    channel
        .put_data_item(
            TODAY_WEATHER_PATH,
            json!({ "date": "Mon Jun 1", "conditionId": 500, "high": "72°", "low": "58°" }),
        )
        .await
        .unwrap();
    advance(10).await;

    face.handle.destroy();
    let canvas = face.task.await.unwrap();
    assert_eq!(
        canvas.last_texts(),
        vec!["14:05", "Mon Jun 1", "72°", "58°", "Rain"]
    );

    shutdown.cancel();
    listener_task.await.unwrap();
}

#[tokio::test]
async fn test_published_snapshot_equals_engine_snapshot() {
    let bus = WeatherBus::new();
    let mut sub = bus.subscribe(DATA_EVENT);
    let listener =
        WeatherSyncListener::new(LoopbackChannel::new(), bus.clone(), &SyncConfig::default());

    let outcome = listener
        .on_data_changed(&[sunshine_sync::DataEvent::with_fields(
            TODAY_WEATHER_PATH,
            json!({ "date": "Mon Jun 1", "conditionId": 500, "high": "72°", "low": "58°" }),
        )])
        .await;
    let published = outcome.published().cloned().unwrap();

    let host = Arc::new(RunnerHost::new(Tz::UTC));
    let mut engine = WatchFaceEngine::new(
        FaceConfig::default(),
        BackgroundSet::placeholder(8, 8),
        host,
        Arc::new(ManualClock::new(NOW_MS)),
        Box::new(ManualTickTimer::new()),
    );
    let message = sub.take_latest().unwrap();
    assert!(engine.on_weather_message(&message));

    let received = engine.render_state().snapshot.as_deref().unwrap();
    assert_eq!(received, &published);
    assert_eq!(received, &WeatherSnapshot::new("Mon Jun 1", 500, "72°", "58°"));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_published_before_start_is_delivered() {
    let bus = WeatherBus::new();
    bus.publish(BusMessage::weather(&WeatherSnapshot::new("Tue", 800, "80°", "60°")).unwrap());

    let face = spawn_face(&bus);
    face.handle.send(FaceEvent::Visibility(true));
    face.handle.send(FaceEvent::Ambient(true));
    advance(10).await;

    face.handle.destroy();
    let canvas = face.task.await.unwrap();
    assert_eq!(canvas.last_texts(), vec!["14:05", "Tue", "80°", "60°", "Clear"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_token_tears_down() {
    let bus = WeatherBus::new();
    let face = spawn_face(&bus);

    face.handle.send(FaceEvent::Visibility(true));
    advance(10).await;
    assert!(face.host.is_time_zone_registered());

    face.shutdown.cancel();
    face.shutdown.cancel();
    face.task.await.unwrap();

    assert!(!face.host.is_time_zone_registered());
    assert_eq!(face.host.time_zone_unregistrations(), 1);
    assert!(!face.handle.send(FaceEvent::TimeTick), "runner still accepting events");
}

#[tokio::test(start_paused = true)]
async fn test_each_tap_redraws() {
    let bus = WeatherBus::new();
    let face = spawn_face(&bus);

    let tap = FaceEvent::Tap {
        tap_type: sunshine_face::TapType::Tap,
        x: 0,
        y: 0,
        event_time: 0,
    };
    face.handle.send(tap.clone());
    face.handle.send(tap);
    advance(10).await;

    face.handle.destroy();
    let canvas = face.task.await.unwrap();
    assert_eq!(face.host.invalidations(), 2);
    // Each event is its own loop turn, so each redraw request gets a frame
    assert_eq!(canvas.frame_count(), 2);
}

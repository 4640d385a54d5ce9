//! Event loop driving one watch face.
//!
//! The runner owns the engine, the bus subscription and the tick channel,
//! and plays the platform's part: it forwards lifecycle events, delivers
//! ticks and weather messages, and draws a frame whenever the engine has
//! invalidated.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::Mutex;
use sunshine_core::FaceConfig;
use sunshine_sync::{BusSubscription, WeatherBus};
use sunshine_weather::DATA_EVENT;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backgrounds::BackgroundSet;
use crate::engine::WatchFaceEngine;
use crate::graphics::{Canvas, Rect};
use crate::host::{Clock, Host, Properties, TapType, WatchFaceStyle};
use crate::tick::TokioTickTimer;

/// Platform callbacks, as delivered to the runner
#[derive(Debug, Clone, PartialEq)]
pub enum FaceEvent {
    Visibility(bool),
    Ambient(bool),
    Properties(Properties),
    Insets { is_round: bool },
    Tap { tap_type: TapType, x: i32, y: i32, event_time: i64 },
    PeekCard(Rect),
    Surface { width: u32, height: u32 },
    TimeTick,
    TimeZone(Tz),
    Destroy,
}

/// Sending side of a running face
#[derive(Debug, Clone)]
pub struct FaceHandle {
    tx: mpsc::UnboundedSender<FaceEvent>,
}

impl FaceHandle {
    /// Returns false once the runner has stopped
    pub fn send(&self, event: FaceEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn destroy(&self) -> bool {
        self.send(FaceEvent::Destroy)
    }
}

/// [`Host`] backed by in-process flags.
///
/// Invalidations set a dirty flag the runner drains once per loop turn, so
/// several invalidations between frames produce one frame.
#[derive(Debug)]
pub struct RunnerHost {
    default_tz: Mutex<Tz>,
    style: Mutex<Option<WatchFaceStyle>>,
    dirty: AtomicBool,
    invalidations: AtomicUsize,
    tz_registered: AtomicBool,
    tz_unregistrations: AtomicUsize,
}

impl RunnerHost {
    pub fn new(default_tz: Tz) -> Self {
        Self {
            default_tz: Mutex::new(default_tz),
            style: Mutex::new(None),
            dirty: AtomicBool::new(false),
            invalidations: AtomicUsize::new(0),
            tz_registered: AtomicBool::new(false),
            tz_unregistrations: AtomicUsize::new(0),
        }
    }

    pub fn set_default_time_zone(&self, tz: Tz) {
        *self.default_tz.lock() = tz;
    }

    pub fn style(&self) -> Option<WatchFaceStyle> {
        self.style.lock().clone()
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn is_time_zone_registered(&self) -> bool {
        self.tz_registered.load(Ordering::SeqCst)
    }

    pub fn time_zone_unregistrations(&self) -> usize {
        self.tz_unregistrations.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag, returning whether a frame is due
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }
}

impl Host for RunnerHost {
    fn set_style(&self, style: WatchFaceStyle) {
        *self.style.lock() = Some(style);
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn register_time_zone_receiver(&self) {
        self.tz_registered.store(true, Ordering::SeqCst);
    }

    fn unregister_time_zone_receiver(&self) {
        if self.tz_registered.swap(false, Ordering::SeqCst) {
            self.tz_unregistrations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn default_time_zone(&self) -> Tz {
        *self.default_tz.lock()
    }
}

pub struct FaceRunner<C> {
    engine: WatchFaceEngine,
    host: Arc<RunnerHost>,
    canvas: C,
    bounds: Rect,
    events: mpsc::UnboundedReceiver<FaceEvent>,
    ticks: mpsc::UnboundedReceiver<u64>,
    // The timer only holds a weak sender; this keeps the channel open
    tick_tx: mpsc::UnboundedSender<u64>,
    subscription: BusSubscription,
}

impl<C: Canvas + Send> FaceRunner<C> {
    /// Build a runner on the current tokio runtime.
    ///
    /// Subscribes to the weather topic immediately, so a snapshot published
    /// before the loop starts is still delivered.
    pub fn new(
        config: FaceConfig,
        backgrounds: BackgroundSet,
        bus: &WeatherBus,
        host: Arc<RunnerHost>,
        clock: Arc<dyn Clock>,
        canvas: C,
        bounds: Rect,
    ) -> Result<(Self, FaceHandle), TryCurrentError> {
        let handle = Handle::try_current()?;
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();

        let timer = TokioTickTimer::new(&tick_tx, handle);
        let engine = WatchFaceEngine::new(
            config,
            backgrounds,
            host.clone(),
            clock,
            Box::new(timer),
        );

        let runner = Self {
            engine,
            host,
            canvas,
            bounds,
            events,
            ticks,
            tick_tx,
            subscription: bus.subscribe(DATA_EVENT),
        };
        Ok((runner, FaceHandle { tx: events_tx }))
    }

    /// Run until `Destroy`, the last handle is dropped, or `shutdown` fires.
    ///
    /// Returns the canvas so callers can inspect what was drawn.
    pub async fn run(self, shutdown: CancellationToken) -> C {
        let FaceRunner {
            mut engine,
            host,
            mut canvas,
            bounds,
            mut events,
            mut ticks,
            tick_tx,
            mut subscription,
        } = self;

        engine.on_create();
        tracing::info!("Watch face running");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(FaceEvent::Destroy) | None => break,
                    Some(event) => dispatch(&mut engine, event),
                },
                Some(generation) = ticks.recv() => engine.on_tick_fired(generation),
                message = subscription.recv(), if subscription.is_active() => match message {
                    Some(message) => {
                        engine.on_weather_message(&message);
                    }
                    None => subscription.unsubscribe(),
                },
            }

            if host.take_dirty() {
                canvas.begin_frame();
                engine.on_draw(&mut canvas, bounds);
            }
        }

        engine.on_destroy();
        subscription.unsubscribe();
        drop(tick_tx);
        tracing::info!(invalidations = host.invalidations(), "Watch face stopped");
        canvas
    }
}

fn dispatch(engine: &mut WatchFaceEngine, event: FaceEvent) {
    match event {
        FaceEvent::Visibility(visible) => engine.on_visibility_changed(visible),
        FaceEvent::Ambient(ambient) => {
            engine.on_ambient_mode_changed(ambient);
        }
        FaceEvent::Properties(properties) => engine.on_properties_changed(properties),
        FaceEvent::Insets { is_round } => engine.on_apply_window_insets(is_round),
        FaceEvent::Tap {
            tap_type,
            x,
            y,
            event_time,
        } => engine.on_tap_command(tap_type, x, y, event_time),
        FaceEvent::PeekCard(rect) => engine.on_peek_card_position_update(rect),
        FaceEvent::Surface { width, height } => engine.on_surface_changed(width, height),
        FaceEvent::TimeTick => engine.on_time_tick(),
        FaceEvent::TimeZone(tz) => engine.on_time_zone_changed(tz),
        // Handled by the loop
        FaceEvent::Destroy => {}
    }
}

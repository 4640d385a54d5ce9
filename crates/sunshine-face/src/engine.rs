//! Watch face state machine.
//!
//! All handlers run on one logical context. The engine never draws on its
//! own: it asks the [`Host`] to invalidate and the host calls
//! [`WatchFaceEngine::on_draw`] with a canvas.

use std::sync::Arc;

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use sunshine_core::FaceConfig;
use sunshine_weather::{condition_label, resolve_icon, BusMessage, WeatherSnapshot, DATA_KEY};

use crate::backgrounds::{BackgroundCache, BackgroundSet};
use crate::graphics::{Canvas, Paint, Rect, BLACK};
use crate::host::{Clock, Host, Properties, TapType, WatchFaceStyle};
use crate::layout::Layout;
use crate::tick::{next_tick_delay, TickTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Interactive,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    NotVisible,
    VisibleInteractive,
    VisibleAmbient,
}

/// Everything the draw step reads
#[derive(Debug, Clone)]
pub struct RenderState {
    pub current_time: DateTime<Tz>,
    pub mode: DisplayMode,
    /// Replaced whole on each weather message
    pub snapshot: Option<Arc<WeatherSnapshot>>,
    pub tap_toggle: bool,
    pub low_bit_ambient: bool,
    pub burn_in_protection: bool,
    pub is_round: bool,
}

impl RenderState {
    pub fn is_ambient(&self) -> bool {
        self.mode == DisplayMode::Ambient
    }

    /// Ambient on a panel that must not show the background at all
    fn black_ambient(&self) -> bool {
        self.is_ambient() && (self.low_bit_ambient || self.burn_in_protection)
    }
}

/// "H:MM" in ambient, "H:MM:SS" otherwise; hours are 0-23 unpadded
pub fn clock_text<T: Timelike>(time: &T, ambient: bool) -> String {
    if ambient {
        format!("{}:{:02}", time.hour(), time.minute())
    } else {
        format!("{}:{:02}:{:02}", time.hour(), time.minute(), time.second())
    }
}

pub struct WatchFaceEngine {
    config: FaceConfig,
    host: Arc<dyn Host>,
    clock: Arc<dyn Clock>,
    timer: Box<dyn TickTimer>,
    backgrounds: BackgroundSet,
    cache: BackgroundCache,
    state: RenderState,
    layout: Layout,
    time_zone: Tz,
    visible: bool,
    tz_registered: bool,
    destroyed: bool,
    anti_alias: bool,
    tap_count: u64,
    peek_card: Rect,
}

impl WatchFaceEngine {
    pub fn new(
        config: FaceConfig,
        backgrounds: BackgroundSet,
        host: Arc<dyn Host>,
        clock: Arc<dyn Clock>,
        timer: Box<dyn TickTimer>,
    ) -> Self {
        let time_zone = host.default_time_zone();
        let cache = BackgroundCache::new(&backgrounds);
        let layout = Layout::for_shape(&config, false);
        let state = RenderState {
            current_time: clock.now().with_timezone(&time_zone),
            mode: DisplayMode::Interactive,
            snapshot: None,
            tap_toggle: false,
            low_bit_ambient: false,
            burn_in_protection: false,
            is_round: false,
        };

        Self {
            config,
            host,
            clock,
            timer,
            backgrounds,
            cache,
            state,
            layout,
            time_zone,
            visible: false,
            tz_registered: false,
            destroyed: false,
            anti_alias: true,
            tap_count: 0,
            peek_card: Rect::default(),
        }
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn background_cache(&self) -> &BackgroundCache {
        &self.cache
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_timer_scheduled(&self) -> bool {
        self.timer.is_scheduled()
    }

    pub fn face_state(&self) -> FaceState {
        match (self.visible, self.state.mode) {
            (false, _) => FaceState::NotVisible,
            (true, DisplayMode::Interactive) => FaceState::VisibleInteractive,
            (true, DisplayMode::Ambient) => FaceState::VisibleAmbient,
        }
    }

    pub fn on_create(&mut self) {
        self.host.set_style(WatchFaceStyle::default());
        tracing::debug!(tz = %self.time_zone, "Watch face created");
    }

    /// Stop the tick and drop the time-zone receiver. Safe to call repeatedly.
    pub fn on_destroy(&mut self) {
        self.timer.cancel();
        self.unregister_time_zone_receiver();
        self.visible = false;
        if !self.destroyed {
            self.destroyed = true;
            tracing::debug!("Watch face destroyed");
        }
    }

    pub fn on_visibility_changed(&mut self, visible: bool) {
        if self.destroyed {
            return;
        }
        self.visible = visible;

        if visible {
            self.register_time_zone_receiver();
            // The zone may have changed while we were hidden
            self.time_zone = self.host.default_time_zone();
            self.resync_time();
        } else {
            self.unregister_time_zone_receiver();
        }

        tracing::debug!(state = ?self.face_state(), "Visibility changed");
        self.update_timer();
    }

    /// Apply an ambient flag from the device.
    ///
    /// Returns whether the mode actually changed; a repeated flag is a no-op
    /// apart from re-evaluating the timer.
    pub fn on_ambient_mode_changed(&mut self, ambient: bool) -> bool {
        if self.destroyed {
            return false;
        }
        let changed = self.state.is_ambient() != ambient;

        if changed {
            self.state.mode = if ambient {
                DisplayMode::Ambient
            } else {
                DisplayMode::Interactive
            };
            if self.state.low_bit_ambient {
                self.anti_alias = !ambient;
            }
            if ambient {
                self.refresh_background();
                if !self.state.black_ambient() {
                    self.cache.prepare_gray();
                }
            }
            tracing::debug!(mode = ?self.state.mode, visible = self.visible, "Ambient mode changed");
            if self.visible {
                self.host.invalidate();
            }
        }

        self.update_timer();
        changed
    }

    pub fn on_properties_changed(&mut self, properties: Properties) {
        self.state.low_bit_ambient = properties.low_bit_ambient;
        self.state.burn_in_protection = properties.burn_in_protection;
        tracing::debug!(
            low_bit_ambient = properties.low_bit_ambient,
            burn_in_protection = properties.burn_in_protection,
            "Display properties"
        );
    }

    pub fn on_apply_window_insets(&mut self, is_round: bool) {
        self.state.is_round = is_round;
        self.layout = Layout::for_shape(&self.config, is_round);
    }

    /// Completed taps flip the background accent. Every tap command redraws.
    pub fn on_tap_command(&mut self, tap_type: TapType, x: i32, y: i32, event_time: i64) {
        if self.destroyed {
            return;
        }
        match tap_type {
            TapType::Touch | TapType::TouchCancel => {
                tracing::trace!(?tap_type, x, y, event_time, "Touch observed");
            }
            TapType::Tap => {
                self.tap_count += 1;
                self.state.tap_toggle = self.tap_count % 2 == 1;
                tracing::debug!(taps = self.tap_count, "Tap");
            }
        }
        self.host.invalidate();
    }

    pub fn on_peek_card_position_update(&mut self, rect: Rect) {
        self.peek_card = rect;
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        if self.cache.resize(&self.backgrounds, width) {
            tracing::debug!(width, height, "Background rescaled");
        }
        if !self.state.low_bit_ambient && !self.state.burn_in_protection {
            self.cache.prepare_gray();
        }
    }

    /// Minute tick from the platform while ambient
    pub fn on_time_tick(&mut self) {
        self.host.invalidate();
    }

    /// Zone change pushed by the platform; ignored unless registered
    pub fn on_time_zone_changed(&mut self, tz: Tz) {
        if !self.tz_registered {
            return;
        }
        tracing::debug!(from = %self.time_zone, to = %tz, "Time zone changed");
        self.time_zone = tz;
        self.resync_time();
        self.host.invalidate();
    }

    /// Take a weather message from the bus.
    ///
    /// Messages without the weather extra are ignored. Returns whether the
    /// snapshot was replaced.
    pub fn on_weather_message(&mut self, message: &BusMessage) -> bool {
        if self.destroyed || !message.has_extra(DATA_KEY) {
            return false;
        }
        let snapshot = match message.weather_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Ignoring weather message: {}", e);
                return false;
            }
        };

        tracing::debug!(date = %snapshot.date, condition = snapshot.condition_code, "Weather received");
        self.state.snapshot = Some(Arc::new(snapshot));
        if self.visible {
            self.host.invalidate();
        }
        true
    }

    /// One tick: redraw, then line the next tick up with the wall clock.
    pub fn handle_update_time(&mut self) {
        self.host.invalidate();
        if self.should_timer_be_running() {
            let delay = next_tick_delay(
                self.clock.now_millis(),
                self.config.interactive_update_rate(),
            );
            self.timer.schedule(delay);
        }
    }

    /// Tick delivered by the timer. Stale generations are dropped.
    pub fn on_tick_fired(&mut self, generation: u64) {
        if self.timer.acknowledge(generation) {
            self.handle_update_time();
        } else {
            tracing::debug!(generation, "Ignoring stale tick");
        }
    }

    pub fn should_timer_be_running(&self) -> bool {
        self.visible && !self.state.is_ambient() && !self.destroyed
    }

    /// Restart the tick immediately if it should run, otherwise stop it
    pub fn update_timer(&mut self) {
        self.timer.cancel();
        if self.should_timer_be_running() {
            self.timer.schedule(std::time::Duration::ZERO);
        }
    }

    pub fn on_draw(&mut self, canvas: &mut dyn Canvas, bounds: Rect) {
        self.refresh_background();
        self.resync_time();

        let background = Paint::fill(self.accent_color());
        if self.state.black_ambient() {
            canvas.draw_color(BLACK);
        } else if self.state.is_ambient() {
            canvas.draw_bitmap(self.cache.gray(), 0.0, 0.0, &background);
        } else {
            canvas.draw_bitmap(self.cache.color(), 0.0, 0.0, &background);
        }

        let mut x = self.layout.x_offset;
        let mut y = self.layout.y_offset;

        let time_paint = self.text_paint(self.layout.text_size);
        let time = clock_text(&self.state.current_time, self.state.is_ambient());
        canvas.draw_text(&time, x, y, &time_paint);

        if let Some(snapshot) = self.state.snapshot.clone() {
            let date_paint = self.text_paint(self.layout.date_text_size);
            let temp_paint = self.text_paint(self.layout.temp_text_size);
            let line_paint = self.text_paint(0.0);
            let gap = self.config.temp_space_width;

            y += self.config.line_height;
            canvas.draw_text(&snapshot.date, x, y, &date_paint);
            y += date_paint.text_size;
            let rule = canvas.measure_text(&snapshot.date, &date_paint);
            canvas.draw_line(x, y, x + rule, y, &line_paint);
            y += self.config.line_width;

            canvas.draw_text(&snapshot.high, x, y, &temp_paint);
            x += canvas.measure_text(&snapshot.high, &temp_paint) + gap;
            canvas.draw_text(&snapshot.low, x, y, &temp_paint);
            x += canvas.measure_text(&snapshot.low, &temp_paint) + gap;
            canvas.draw_text(condition_label(snapshot.condition_code), x, y, &temp_paint);
        }

        if self.state.is_ambient() {
            let card = self.peek_card.intersect(&bounds);
            if !card.is_empty() {
                canvas.draw_rect(&card, &background);
            }
        }
    }

    fn accent_color(&self) -> u32 {
        if self.state.tap_toggle {
            self.config.background_color_alt
        } else {
            self.config.background_color
        }
    }

    fn text_paint(&self, text_size: f32) -> Paint {
        Paint {
            color: self.config.time_color,
            text_size,
            anti_alias: self.anti_alias,
        }
    }

    /// Follow the snapshot's condition; unknown codes keep the current background
    fn refresh_background(&mut self) {
        let icon = self
            .state
            .snapshot
            .as_ref()
            .and_then(|s| resolve_icon(s.condition_code));
        self.cache.select(&self.backgrounds, icon);
    }

    fn resync_time(&mut self) {
        self.state.current_time = self.clock.now().with_timezone(&self.time_zone);
    }

    fn register_time_zone_receiver(&mut self) {
        if self.tz_registered {
            return;
        }
        self.tz_registered = true;
        self.host.register_time_zone_receiver();
    }

    fn unregister_time_zone_receiver(&mut self) {
        if !self.tz_registered {
            return;
        }
        self.tz_registered = false;
        self.host.unregister_time_zone_receiver();
    }
}

impl Drop for WatchFaceEngine {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

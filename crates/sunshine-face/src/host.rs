//! Capabilities the platform host lends to the engine.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// How notification cards may cover the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeekMode {
    Short,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundVisibility {
    Interruptive,
    Persistent,
}

/// Declared once when the face is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchFaceStyle {
    pub peek_mode: PeekMode,
    pub background_visibility: BackgroundVisibility,
    /// The face draws its own clock
    pub show_system_ui_time: bool,
    pub accepts_tap_events: bool,
}

impl Default for WatchFaceStyle {
    fn default() -> Self {
        Self {
            peek_mode: PeekMode::Variable,
            background_visibility: BackgroundVisibility::Interruptive,
            show_system_ui_time: false,
            accepts_tap_events: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapType {
    /// Finger down
    Touch,
    /// Gesture turned into something else
    TouchCancel,
    /// Completed tap
    Tap,
}

/// Display capabilities reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Properties {
    pub low_bit_ambient: bool,
    pub burn_in_protection: bool,
}

/// Platform services used by the engine.
///
/// Calls arrive on the engine's context only.
pub trait Host: Send + Sync {
    fn set_style(&self, style: WatchFaceStyle);

    /// Ask for a frame; the host calls back into `on_draw` later
    fn invalidate(&self);

    fn register_time_zone_receiver(&self);

    fn unregister_time_zone_receiver(&self);

    fn default_time_zone(&self) -> Tz;
}

/// Wall clock
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_millis()).unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_default_style_matches_face() {
        let style = WatchFaceStyle::default();
        assert_eq!(style.peek_mode, PeekMode::Variable);
        assert_eq!(style.background_visibility, BackgroundVisibility::Interruptive);
        assert!(!style.show_system_ui_time);
        assert!(style.accepts_tap_events);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_450);
        clock.advance(Duration::from_millis(550));
        assert_eq!(clock.now_millis(), 2_000);
        assert_eq!(clock.now().second(), 2);

        clock.set_millis(-1);
        assert_eq!(clock.now_millis(), -1);
        assert_eq!(clock.now().second(), 59);
    }
}

//! Sunshine watch face
//!
//! The rendering state machine, its redraw tick, and a runner that stands in
//! for the platform host.

pub mod backgrounds;
pub mod engine;
pub mod graphics;
pub mod host;
pub mod layout;
pub mod recording;
pub mod runner;
pub mod tick;

pub use backgrounds::{BackgroundCache, BackgroundSet, INITIAL_ICON};
pub use engine::{clock_text, DisplayMode, FaceState, RenderState, WatchFaceEngine};
pub use graphics::{Bitmap, Canvas, Paint, Rect, BLACK};
pub use host::{
    BackgroundVisibility, Clock, Host, ManualClock, PeekMode, Properties, SystemClock, TapType,
    WatchFaceStyle,
};
pub use layout::Layout;
pub use recording::{DrawOp, RecordingCanvas};
pub use runner::{FaceEvent, FaceHandle, FaceRunner, RunnerHost};
pub use tick::{next_tick_delay, ManualTickTimer, TickTimer, TokioTickTimer};

//! Self-rescheduling redraw tick.
//!
//! A fired tick is delivered as its generation number. The engine asks the
//! timer to [`acknowledge`](TickTimer::acknowledge) it first; anything from
//! a cancelled or superseded schedule is ignored there.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delay until the next multiple of `interval` on the wall clock.
///
/// A tick that lands exactly on a boundary waits a full interval.
pub fn next_tick_delay(now_ms: i64, interval: Duration) -> Duration {
    let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
    if interval_ms <= 0 {
        return Duration::ZERO;
    }
    let remaining = interval_ms - now_ms.rem_euclid(interval_ms);
    Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
}

pub trait TickTimer: Send {
    /// Replace any pending firing with one after `delay`
    fn schedule(&mut self, delay: Duration);

    /// Drop the pending firing, if any. Safe to call repeatedly.
    fn cancel(&mut self);

    /// Accept a fired generation. Returns false for stale firings.
    fn acknowledge(&mut self, generation: u64) -> bool;

    fn is_scheduled(&self) -> bool;
}

/// Tokio-backed timer.
///
/// Firings are sent on a channel owned by the face loop. The timer only keeps
/// a weak sender, so a torn-down loop closes the channel and late firings go
/// nowhere.
pub struct TokioTickTimer {
    tx: mpsc::WeakUnboundedSender<u64>,
    handle: Handle,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl TokioTickTimer {
    pub fn new(tx: &mpsc::UnboundedSender<u64>, handle: Handle) -> Self {
        Self {
            tx: tx.downgrade(),
            handle,
            generation: 0,
            pending: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl TickTimer for TokioTickTimer {
    fn schedule(&mut self, delay: Duration) {
        self.cancel();
        self.generation += 1;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();
        let generation = self.generation;

        self.handle.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(generation);
                    }
                }
            }
        });

        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::trace!(generation, delay_ms, "Tick scheduled");
        self.pending = Some(token);
    }

    fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
            tracing::trace!(generation = self.generation, "Tick cancelled");
        }
    }

    fn acknowledge(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for TokioTickTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    generation: u64,
    pending: Option<Duration>,
    scheduled: Vec<Duration>,
    cancels: usize,
}

/// Timer that never fires on its own.
///
/// Clones share state, so a test can keep one and hand the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualTickTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTickTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation and delay of the pending firing
    pub fn pending(&self) -> Option<(u64, Duration)> {
        let state = self.state.lock();
        state.pending.map(|delay| (state.generation, delay))
    }

    /// Every delay ever scheduled, oldest first
    pub fn scheduled(&self) -> Vec<Duration> {
        self.state.lock().scheduled.clone()
    }

    /// Cancels that actually removed a pending firing
    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancels
    }
}

impl TickTimer for ManualTickTimer {
    fn schedule(&mut self, delay: Duration) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.pending = Some(delay);
        state.scheduled.push(delay);
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock();
        if state.pending.take().is_some() {
            state.cancels += 1;
        }
    }

    fn acknowledge(&mut self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.pending.is_some() && generation == state.generation {
            state.pending = None;
            true
        } else {
            false
        }
    }

    fn is_scheduled(&self) -> bool {
        self.state.lock().pending.is_some()
    }
}

//! In-memory sync channel.
//!
//! Stands in for the companion transport in the harness and in tests:
//! data items put on one end come out as batches on the other, and the
//! connect behaviour can be scripted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sunshine_core::SyncError;
use tokio::sync::mpsc;

use crate::channel::{DataEvent, DataEventBatch, SyncChannel};

const BATCH_QUEUE_CAPACITY: usize = 16;

/// What the next `connect` call does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Fail(String),
    /// Never completes; only a timeout ends the attempt
    Hang,
    /// Succeeds after the given delay
    Delay(Duration),
}

/// Clears the connecting flag when an attempt ends, including when a timeout
/// drops it mid-flight.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl<'a> ConnectingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct LoopbackChannel {
    connected: AtomicBool,
    connecting: AtomicBool,
    connect_attempts: AtomicUsize,
    behavior: Mutex<ConnectBehavior>,
    batch_tx: mpsc::Sender<DataEventBatch>,
    batch_rx: Mutex<Option<mpsc::Receiver<DataEventBatch>>>,
}

impl LoopbackChannel {
    pub fn new() -> Arc<Self> {
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_QUEUE_CAPACITY);
        Arc::new(Self {
            connected: AtomicBool::new(false),
            connecting: AtomicBool::new(false),
            connect_attempts: AtomicUsize::new(0),
            behavior: Mutex::new(ConnectBehavior::Succeed),
            batch_tx,
            batch_rx: Mutex::new(Some(batch_rx)),
        })
    }

    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Drop the connection so the next batch has to reconnect
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Receiving end of delivered batches. Can be taken once.
    pub fn take_batches(&self) -> Option<mpsc::Receiver<DataEventBatch>> {
        self.batch_rx.lock().take()
    }

    /// Deliver a batch to the listener side
    pub async fn deliver(&self, batch: DataEventBatch) -> Result<(), SyncError> {
        self.batch_tx
            .send(batch)
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Companion side: put a single data item
    pub async fn put_data_item(&self, path: &str, fields: Value) -> Result<(), SyncError> {
        self.deliver(vec![DataEvent::with_fields(path, fields)])
            .await
    }
}

#[async_trait]
impl SyncChannel for LoopbackChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), SyncError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().clone();

        let guard = ConnectingGuard::enter(&self.connecting);
        let result = match behavior {
            ConnectBehavior::Succeed => Ok(()),
            ConnectBehavior::Fail(reason) => Err(SyncError::ConnectFailed(reason)),
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            ConnectBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        };
        drop(guard);

        if result.is_ok() {
            self.connected.store(true, Ordering::SeqCst);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_connect_succeeds_by_default() {
        let channel = LoopbackChannel::new();
        assert!(!channel.is_connected());
        channel.connect().await.unwrap();
        assert!(channel.is_connected());
        assert!(!channel.is_connecting());
        assert_eq!(channel.connect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_connect_clears_connecting() {
        let channel = LoopbackChannel::new();
        channel.set_behavior(ConnectBehavior::Hang);

        let attempt = tokio::time::timeout(Duration::from_secs(30), channel.connect()).await;
        assert!(attempt.is_err());
        assert!(!channel.is_connecting());
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let channel = LoopbackChannel::new();
        channel.set_behavior(ConnectBehavior::Fail("no peer".into()));
        let err = channel.connect().await.unwrap_err();
        assert!(matches!(err, SyncError::ConnectFailed(reason) if reason == "no peer"));
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn test_put_data_item_arrives_as_single_event_batch() {
        let channel = LoopbackChannel::new();
        let mut batches = channel.take_batches().unwrap();
        assert!(channel.take_batches().is_none());

        channel
            .put_data_item("/today-weather", json!({ "date": "Mon" }))
            .await
            .unwrap();

        let batch = batches.recv().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].path, "/today-weather");
    }

    #[tokio::test]
    async fn test_deliver_after_receiver_dropped_reports_closed() {
        let channel = LoopbackChannel::new();
        drop(channel.take_batches());
        let err = channel.deliver(Vec::new()).await.unwrap_err();
        assert!(matches!(err, SyncError::ChannelClosed));
    }
}

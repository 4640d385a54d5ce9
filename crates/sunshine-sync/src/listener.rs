//! Weather data listener.
//!
//! Receives batches from the companion sync channel, picks out the
//! today-weather item and republishes it on the in-process bus.

use std::sync::Arc;
use std::time::Duration;

use sunshine_core::{SyncConfig, SyncError};
use sunshine_weather::{BusMessage, WeatherSnapshot};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::WeatherBus;
use crate::channel::{DataEvent, DataEventBatch, SyncChannel};

pub const TODAY_WEATHER_PATH: &str = "/today-weather";

/// What happened to one delivered batch
#[derive(Debug)]
pub enum BatchOutcome {
    /// A snapshot was extracted and published once
    Published(WeatherSnapshot),
    /// No event carried the weather path
    NoMatch,
    /// The weather event was present but unreadable
    Malformed(SyncError),
    /// The channel could not be connected; the batch was dropped
    Skipped(SyncError),
}

impl BatchOutcome {
    pub fn published(&self) -> Option<&WeatherSnapshot> {
        match self {
            BatchOutcome::Published(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Pull the four weather fields out of a data item.
///
/// The sync side names the code `conditionId`.
pub fn extract_snapshot(event: &DataEvent) -> Result<WeatherSnapshot, SyncError> {
    let malformed = |reason: &str| SyncError::MalformedPayload {
        path: event.path.clone(),
        reason: reason.to_string(),
    };

    let date = event.get_str("date").ok_or_else(|| malformed("missing date"))?;
    let condition_code = event
        .get_i32("conditionId")
        .ok_or_else(|| malformed("missing conditionId"))?;
    let high = event.get_str("high").ok_or_else(|| malformed("missing high"))?;
    let low = event.get_str("low").ok_or_else(|| malformed("missing low"))?;

    Ok(WeatherSnapshot::new(date, condition_code, high, low))
}

pub struct WeatherSyncListener {
    channel: Arc<dyn SyncChannel>,
    bus: WeatherBus,
    weather_path: String,
    connect_timeout: Duration,
}

impl WeatherSyncListener {
    pub fn new(channel: Arc<dyn SyncChannel>, bus: WeatherBus, config: &SyncConfig) -> Self {
        Self {
            channel,
            bus,
            weather_path: config.weather_path.clone(),
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Connect unless the channel is already connected or connecting.
    async fn ensure_connected(&self) -> Result<(), SyncError> {
        if self.channel.is_connected() || self.channel.is_connecting() {
            return Ok(());
        }

        match tokio::time::timeout(self.connect_timeout, self.channel.connect()).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::ConnectTimeout(self.connect_timeout)),
        }
    }

    /// Handle one batch from the sync channel.
    ///
    /// The first event on the weather path wins; later events in the same
    /// batch are not inspected. Nothing is retried here: the next batch
    /// reconnects if needed.
    pub async fn on_data_changed(&self, events: &[DataEvent]) -> BatchOutcome {
        if let Err(e) = self.ensure_connected().await {
            tracing::error!("Failed to connect to sync channel, dropping batch: {}", e);
            return BatchOutcome::Skipped(e);
        }

        let Some(event) = events.iter().find(|e| e.path == self.weather_path) else {
            tracing::debug!(events = events.len(), "No weather item in batch");
            return BatchOutcome::NoMatch;
        };

        let snapshot = match extract_snapshot(event) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Ignoring weather item: {}", e);
                return BatchOutcome::Malformed(e);
            }
        };

        match BusMessage::weather(&snapshot) {
            Ok(message) => self.bus.publish(message),
            Err(e) => {
                tracing::error!("Failed to encode weather message: {}", e);
                return BatchOutcome::Malformed(SyncError::MalformedPayload {
                    path: event.path.clone(),
                    reason: e.to_string(),
                });
            }
        }

        tracing::info!(
            date = %snapshot.date,
            condition = snapshot.condition_code,
            "Published weather update"
        );
        BatchOutcome::Published(snapshot)
    }

    /// Process batches one at a time until the channel closes or shutdown fires.
    pub async fn run(
        self,
        mut batches: mpsc::Receiver<DataEventBatch>,
        shutdown: CancellationToken,
    ) {
        tracing::info!(path = %self.weather_path, "Weather listener started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                batch = batches.recv() => match batch {
                    Some(batch) => {
                        self.on_data_changed(&batch).await;
                    }
                    None => {
                        tracing::info!("Sync channel closed");
                        break;
                    }
                },
            }
        }
        tracing::info!("Weather listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_reads_all_fields() {
        let event = DataEvent::with_fields(
            TODAY_WEATHER_PATH,
            json!({ "date": "Mon Jun 1", "conditionId": 500, "high": "72°", "low": "58°" }),
        );
        let snapshot = extract_snapshot(&event).unwrap();
        assert_eq!(snapshot, WeatherSnapshot::new("Mon Jun 1", 500, "72°", "58°"));
    }

    #[test]
    fn test_extract_reports_first_missing_field() {
        let event = DataEvent::with_fields(
            TODAY_WEATHER_PATH,
            json!({ "date": "Mon Jun 1", "high": "72°", "low": "58°" }),
        );
        let err = extract_snapshot(&event).unwrap_err();
        assert!(matches!(
            err,
            SyncError::MalformedPayload { ref reason, .. } if reason == "missing conditionId"
        ));
    }

    #[test]
    fn test_extract_rejects_renamed_code_field() {
        // weatherId is the bus-side name; the sync side must send conditionId.
        let event = DataEvent::with_fields(
            TODAY_WEATHER_PATH,
            json!({ "date": "Mon", "weatherId": 500, "high": "1", "low": "0" }),
        );
        assert!(extract_snapshot(&event).is_err());
    }

    #[test]
    fn test_outcome_published_accessor() {
        let outcome = BatchOutcome::Published(WeatherSnapshot::new("d", 1, "h", "l"));
        assert!(outcome.published().is_some());
        assert!(BatchOutcome::NoMatch.published().is_none());
    }
}

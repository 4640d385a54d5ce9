//! Wire format of the in-process weather broadcast.
//!
//! The listener publishes a [`BusMessage`] under the [`DATA_EVENT`] topic
//! with the weather bundle stored under [`DATA_KEY`]. On the bus the
//! condition code is named `weatherId`; on the sync channel it is
//! `conditionId`. Both names are part of the contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::WeatherSnapshot;

pub const DATA_EVENT: &str = "DATA_EVENT";
pub const DATA_KEY: &str = "DATA_KEY";

/// Bus payload for one weather update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub date: String,
    #[serde(rename = "weatherId")]
    pub weather_id: i32,
    pub high: String,
    pub low: String,
}

impl From<&WeatherSnapshot> for WeatherBundle {
    fn from(snapshot: &WeatherSnapshot) -> Self {
        Self {
            date: snapshot.date.clone(),
            weather_id: snapshot.condition_code,
            high: snapshot.high.clone(),
            low: snapshot.low.clone(),
        }
    }
}

impl From<WeatherBundle> for WeatherSnapshot {
    fn from(bundle: WeatherBundle) -> Self {
        Self {
            date: bundle.date,
            condition_code: bundle.weather_id,
            high: bundle.high,
            low: bundle.low,
        }
    }
}

/// Bus payload errors
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Unexpected topic: {0}")]
    WrongTopic(String),
    #[error("Message has no DATA_KEY extra")]
    MissingPayload,
    #[error("Failed to encode weather bundle: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode weather bundle: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A topic plus named extras, delivered to subscribers of that topic
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: String,
    pub extras: Map<String, Value>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            extras: Map::new(),
        }
    }

    /// Build the `DATA_EVENT` message carrying a weather snapshot
    pub fn weather(snapshot: &WeatherSnapshot) -> Result<Self, BusError> {
        let bundle = serde_json::to_value(WeatherBundle::from(snapshot)).map_err(BusError::Encode)?;
        let mut message = Self::new(DATA_EVENT);
        message.extras.insert(DATA_KEY.to_string(), bundle);
        Ok(message)
    }

    pub fn has_extra(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    /// Decode the weather snapshot from a `DATA_EVENT` message
    pub fn weather_snapshot(&self) -> Result<WeatherSnapshot, BusError> {
        if self.topic != DATA_EVENT {
            return Err(BusError::WrongTopic(self.topic.clone()));
        }
        let value = self.extras.get(DATA_KEY).ok_or(BusError::MissingPayload)?;
        let bundle: WeatherBundle =
            serde_json::from_value(value.clone()).map_err(BusError::Decode)?;
        Ok(bundle.into())
    }
}

//! In-process weather broadcast.
//!
//! One latest-value slot per topic. Publishing replaces the slot in a
//! single step, so a subscriber never observes a half-written snapshot.
//! The bus is passed explicitly to the listener and the face; there is no
//! process-wide registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sunshine_weather::BusMessage;
use tokio::sync::watch;

type Slot = Option<Arc<BusMessage>>;

#[derive(Clone, Default)]
pub struct WeatherBus {
    topics: Arc<Mutex<HashMap<String, watch::Sender<Slot>>>>,
}

impl WeatherBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &str) -> watch::Sender<Slot> {
        let mut topics = self.topics.lock();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }

    /// Replace the latest message on the message's topic
    pub fn publish(&self, message: BusMessage) {
        let topic = message.topic.clone();
        let tx = self.sender(&topic);
        tx.send_replace(Some(Arc::new(message)));
        tracing::debug!(topic = %topic, subscribers = tx.receiver_count(), "Published bus message");
    }

    /// Subscribe to a topic. A message published before subscribing is
    /// still delivered once.
    pub fn subscribe(&self, topic: &str) -> BusSubscription {
        let mut rx = self.sender(topic).subscribe();
        if rx.borrow().is_some() {
            rx.mark_changed();
        }
        BusSubscription {
            topic: topic.to_string(),
            rx: Some(rx),
        }
    }

    /// Latest message on a topic without subscribing
    pub fn latest(&self, topic: &str) -> Option<Arc<BusMessage>> {
        self.topics
            .lock()
            .get(topic)
            .and_then(|tx| tx.borrow().clone())
    }
}

impl std::fmt::Debug for WeatherBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics: Vec<String> = self.topics.lock().keys().cloned().collect();
        f.debug_struct("WeatherBus").field("topics", &topics).finish()
    }
}

/// Receiving end of one topic
#[derive(Debug)]
pub struct BusSubscription {
    topic: String,
    rx: Option<watch::Receiver<Slot>>,
}

impl BusSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Take the latest unseen message, if any, without waiting
    pub fn take_latest(&mut self) -> Option<Arc<BusMessage>> {
        let rx = self.rx.as_mut()?;
        if !rx.has_changed().unwrap_or(false) {
            return None;
        }
        rx.borrow_and_update().clone()
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once unsubscribed or when the bus is gone.
    pub async fn recv(&mut self) -> Option<Arc<BusMessage>> {
        let rx = self.rx.as_mut()?;
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            if let Some(message) = rx.borrow_and_update().clone() {
                return Some(message);
            }
        }
    }

    /// Stop receiving. Safe to call repeatedly.
    pub fn unsubscribe(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!(topic = %self.topic, "Unsubscribed from bus");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunshine_weather::{WeatherSnapshot, DATA_EVENT};

    fn weather(date: &str, code: i32) -> BusMessage {
        BusMessage::weather(&WeatherSnapshot::new(date, code, "1°", "0°")).unwrap()
    }

    #[test]
    fn test_subscriber_sees_latest_only() {
        let bus = WeatherBus::new();
        let mut sub = bus.subscribe(DATA_EVENT);
        assert!(sub.take_latest().is_none());

        bus.publish(weather("Mon", 500));
        bus.publish(weather("Tue", 800));

        let latest = sub.take_latest().unwrap();
        assert_eq!(latest.weather_snapshot().unwrap().date, "Tue");
        assert!(sub.take_latest().is_none());
    }

    #[test]
    fn test_late_subscriber_gets_previous_message() {
        let bus = WeatherBus::new();
        bus.publish(weather("Mon", 500));

        let mut sub = bus.subscribe(DATA_EVENT);
        assert!(sub.take_latest().is_some());
        assert!(sub.take_latest().is_none());
    }

    #[test]
    fn test_topics_are_isolated() {
        let bus = WeatherBus::new();
        let mut sub = bus.subscribe(DATA_EVENT);
        bus.publish(BusMessage::new("OTHER"));
        assert!(sub.take_latest().is_none());
        assert!(bus.latest("OTHER").is_some());
        assert!(bus.latest(DATA_EVENT).is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = WeatherBus::new();
        let mut sub = bus.subscribe(DATA_EVENT);
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());

        bus.publish(weather("Mon", 500));
        assert!(sub.take_latest().is_none());
    }

    #[tokio::test]
    async fn test_recv_waits_for_publish() {
        let bus = WeatherBus::new();
        let mut sub = bus.subscribe(DATA_EVENT);

        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(weather("Wed", 300));
        });

        let message = sub.recv().await.unwrap();
        assert_eq!(message.weather_snapshot().unwrap().condition_code, 300);
    }

    #[tokio::test]
    async fn test_recv_after_unsubscribe_returns_none() {
        let bus = WeatherBus::new();
        let mut sub = bus.subscribe(DATA_EVENT);
        sub.unsubscribe();
        assert!(sub.recv().await.is_none());
    }
}

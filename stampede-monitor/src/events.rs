//! Monitor event broadcasting
//!
//! Subscribers receive a copy of every event published after they
//! subscribed. Slow subscribers lag and lose the oldest events rather than
//! slowing the analysis loop down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::Bottleneck;

/// Maximum number of events buffered per subscriber
const EVENT_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringStarted {
        timestamp: DateTime<Utc>,
    },
    MonitoringStopped {
        timestamp: DateTime<Utc>,
    },
    /// Published on every upsert, both new and refreshed bottlenecks
    BottleneckDetected {
        bottleneck: Bottleneck,
    },
    AnalysisComplete {
        timestamp: DateTime<Utc>,
        bottlenecks: Vec<Bottleneck>,
    },
}

/// Fan-out of monitor events to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<MonitorEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn broadcast(&self, event: MonitorEvent) {
        match self.tx.send(event) {
            Ok(subscriber_count) => {
                debug!("Broadcasted monitor event to {} subscribers", subscriber_count);
            }
            Err(_) => {
                debug!("No subscribers for monitor events");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        let timestamp = Utc::now();
        broadcaster.broadcast(MonitorEvent::MonitoringStarted { timestamp });

        assert_eq!(
            first.recv().await.unwrap(),
            MonitorEvent::MonitoringStarted { timestamp }
        );
        assert_eq!(
            second.recv().await.unwrap(),
            MonitorEvent::MonitoringStarted { timestamp }
        );
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let broadcaster = EventBroadcaster::default();
        broadcaster.broadcast(MonitorEvent::MonitoringStopped {
            timestamp: Utc::now(),
        });
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_event_tags() {
        let json = serde_json::to_value(MonitorEvent::AnalysisComplete {
            timestamp: Utc::now(),
            bottlenecks: Vec::new(),
        })
        .unwrap();
        assert_eq!(json["type"], "analysis_complete");
    }
}

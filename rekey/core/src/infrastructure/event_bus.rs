// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Rotation Events
//
// In-memory audit stream using tokio broadcast channels. The rotation engine
// owns a handle and publishes every state transition; the CLI and tests
// subscribe to observe them. Events published with no subscriber are dropped.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{RotationEvent, MAX_EVENTS_PER_PROFILE};

const DEFAULT_CAPACITY: usize = 1000;

/// Event bus for publishing and subscribing to rotation events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<RotationEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity.
    /// Capacity determines how many events can be buffered per subscriber
    /// before the oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Create an event bus that can buffer every event of a run over
    /// `profiles` profiles without a subscriber lagging
    pub fn for_profiles(profiles: usize) -> Self {
        Self::new(
            profiles
                .saturating_mul(MAX_EVENTS_PER_PROFILE)
                .max(DEFAULT_CAPACITY),
        )
    }

    /// Publish a rotation event to all subscribers
    pub fn publish(&self, event: RotationEvent) {
        debug!(profile = %event.profile(), event = event.kind(), "Publishing rotation event");

        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all rotation events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            profile: None,
            dropped: 0,
        }
    }

    /// Subscribe and filter for a single profile
    pub fn subscribe_profile(&self, profile: impl Into<String>) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            profile: Some(profile.into()),
            dropped: 0,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiver for rotation events, optionally filtered by profile
pub struct EventReceiver {
    receiver: broadcast::Receiver<RotationEvent>,
    profile: Option<String>,
    dropped: u64,
}

impl EventReceiver {
    /// Receive the next matching event (waits until one is available)
    pub async fn recv(&mut self) -> Result<RotationEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Try to receive a matching event without waiting
    pub fn try_recv(&mut self) -> Result<RotationEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(|e| match e {
                broadcast::error::TryRecvError::Empty => EventBusError::Empty,
                broadcast::error::TryRecvError::Closed => EventBusError::Closed,
                broadcast::error::TryRecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Collect every buffered matching event. Events lost to lag are
    /// skipped and counted in [`EventReceiver::dropped`].
    pub fn drain(&mut self) -> Vec<RotationEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(n)) => self.dropped += n,
                Err(_) => break,
            }
        }
        events
    }

    /// Number of events this receiver has lost to lag while draining
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn matches(&self, event: &RotationEvent) -> bool {
        self.profile
            .as_deref()
            .map_or(true, |profile| event.profile() == profile)
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn started(profile: &str) -> RotationEvent {
        RotationEvent::RotationStarted {
            profile: profile.to_string(),
            old_key_id: "AKIAOLD".to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(started("default"));

        let received = receiver.recv().await.unwrap();
        match received {
            RotationEvent::RotationStarted { profile, old_key_id, .. } => {
                assert_eq!(profile, "default");
                assert_eq!(old_key_id, "AKIAOLD");
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[tokio::test]
    async fn test_profile_event_filtering() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe_profile("prod");

        // Different profile (should be filtered out)
        event_bus.publish(started("dev"));
        event_bus.publish(started("prod"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.profile(), "prod");
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(started("default"));

        // Both receivers should get the event
        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let event_bus = EventBus::default();
        event_bus.publish(started("default"));

        let mut late = event_bus.subscribe();
        assert!(late.drain().is_empty());
    }

    #[test]
    fn test_drain_returns_events_in_order() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(started("a"));
        event_bus.publish(started("b"));

        let profiles: Vec<String> = receiver
            .drain()
            .iter()
            .map(|e| e.profile().to_string())
            .collect();
        assert_eq!(profiles, vec!["a", "b"]);
    }

    #[test]
    fn test_drain_counts_lagged_events() {
        let event_bus = EventBus::new(2);
        let mut receiver = event_bus.subscribe();

        for profile in ["a", "b", "c", "d"] {
            event_bus.publish(started(profile));
        }

        let profiles: Vec<String> = receiver
            .drain()
            .iter()
            .map(|e| e.profile().to_string())
            .collect();
        assert_eq!(profiles, vec!["c", "d"]);
        assert_eq!(receiver.dropped(), 2);
    }

    #[test]
    fn test_bus_sized_for_large_runs_keeps_every_event() {
        let profiles = 300;
        let event_bus = EventBus::for_profiles(profiles);
        let mut receiver = event_bus.subscribe();

        for i in 0..profiles * MAX_EVENTS_PER_PROFILE {
            event_bus.publish(started(&format!("p{}", i)));
        }

        assert_eq!(receiver.drain().len(), profiles * MAX_EVENTS_PER_PROFILE);
        assert_eq!(receiver.dropped(), 0);
    }
}

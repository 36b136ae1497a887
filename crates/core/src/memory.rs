// In-memory implementations for dev mode and testing
//
// These implementations keep all data in memory, making them perfect for:
// - Running the control plane without a database
// - Unit and integration tests
// - Quick prototyping

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{OutreachError, Result};
use crate::event::{Event, EventStatus, NewEvent, Stats};
use crate::responder::{NewResponder, Responder};
use crate::traits::{EventStore, ResponderStore};

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    responders: Vec<Responder>,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory event and responder store
///
/// Cloning shares the underlying data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert_event(&self, input: NewEvent) -> Result<Event> {
        let mut state = self.state.write().await;

        // Keep created_at non-decreasing across inserts even if the clock steps back
        let created_at = match state.last_created_at {
            Some(last) if last > input.created_at => last,
            _ => input.created_at,
        };
        state.last_created_at = Some(created_at);

        let event = Event {
            id: Uuid::now_v7(),
            device_id: input.device_id,
            event_type: input.event_type,
            raw_payload: input.raw_payload,
            created_at,
            matched_responders: Vec::new(),
            status: EventStatus::New,
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn mark_notified(&self, event_id: Uuid, responder_ids: &[Uuid]) -> Result<Event> {
        if responder_ids.is_empty() {
            return Err(OutreachError::validation(
                "an event cannot be notified without matched responders",
            ));
        }

        let mut state = self.state.write().await;
        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(OutreachError::EventNotFound(event_id))?;

        event.matched_responders = responder_ids.to_vec();
        event.status = EventStatus::Notified;
        Ok(event.clone())
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
        Ok(self
            .state
            .read()
            .await
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned())
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        let mut events = state.events.clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        events.truncate(limit);
        Ok(events)
    }

    async fn clear_events(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let count = state.events.len() as u64;
        state.events.clear();
        Ok(count)
    }

    async fn stats(&self) -> Result<Stats> {
        let state = self.state.read().await;
        Ok(Stats {
            total_events: state.events.len() as u64,
            total_responders: state.responders.len() as u64,
            active_alerts: state
                .events
                .iter()
                .filter(|e| e.status == EventStatus::Notified)
                .count() as u64,
        })
    }
}

#[async_trait]
impl ResponderStore for InMemoryStore {
    async fn create_responder(&self, input: NewResponder) -> Result<Responder> {
        let responder = Responder {
            id: Uuid::now_v7(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            location: input.location,
            services: input.services,
            created_at: Utc::now(),
        };
        self.state.write().await.responders.push(responder.clone());
        Ok(responder)
    }

    async fn list_responders(&self) -> Result<Vec<Responder>> {
        Ok(self.state.read().await.responders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_event(created_at: DateTime<Utc>) -> NewEvent {
        NewEvent {
            device_id: "D1".to_string(),
            event_type: "motion".to_string(),
            raw_payload: "{}".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_created_at_never_goes_backwards() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let first = store.insert_event(new_event(now)).await.unwrap();
        let second = store
            .insert_event(new_event(now - Duration::seconds(30)))
            .await
            .unwrap();
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_list_events_most_recent_first_and_bounded() {
        let store = InMemoryStore::new();
        let start = Utc::now();
        for i in 0..5 {
            store
                .insert_event(new_event(start + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let events = store.list_events(3).await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(events[0].created_at >= events[1].created_at);
        assert!(events[1].created_at >= events[2].created_at);
    }

    #[tokio::test]
    async fn test_clear_events_returns_count() {
        let store = InMemoryStore::new();
        for _ in 0..5 {
            store.insert_event(new_event(Utc::now())).await.unwrap();
        }
        assert_eq!(store.clear_events().await.unwrap(), 5);
        assert!(store.list_events(50).await.unwrap().is_empty());
        assert_eq!(store.clear_events().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_notified_requires_responders() {
        let store = InMemoryStore::new();
        let event = store.insert_event(new_event(Utc::now())).await.unwrap();
        assert!(store.mark_notified(event.id, &[]).await.is_err());

        let responder_id = Uuid::now_v7();
        let updated = store.mark_notified(event.id, &[responder_id]).await.unwrap();
        assert_eq!(updated.status, EventStatus::Notified);
        assert_eq!(updated.matched_responders, vec![responder_id]);
        assert_eq!(store.stats().await.unwrap().active_alerts, 1);
    }

    #[tokio::test]
    async fn test_mark_notified_unknown_event() {
        let store = InMemoryStore::new();
        let err = store
            .mark_notified(Uuid::now_v7(), &[Uuid::now_v7()])
            .await
            .unwrap_err();
        assert!(matches!(err, OutreachError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_responders_keep_creation_order() {
        let store = InMemoryStore::new();
        for name in ["A", "B", "C"] {
            store
                .create_responder(NewResponder {
                    name: name.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_responders()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}

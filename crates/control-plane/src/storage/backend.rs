// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// StorageBackend works with either PostgreSQL (production) or the core
// in-memory store (dev mode) and exposes both through the core store traits.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use outreach_core::{
    Event, EventStore, InMemoryStore, NewEvent, NewResponder, OutreachError, Responder,
    ResponderStore, Result, Stats,
};
use uuid::Uuid;

use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory store (dev mode)
    InMemory(InMemoryStore),
}

impl StorageBackend {
    /// Connect to PostgreSQL and apply migrations
    pub async fn postgres(database_url: &str) -> AnyResult<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }

    /// Short backend name for health output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }
}

fn store_err(err: anyhow::Error) -> OutreachError {
    OutreachError::store(format!("{:#}", err))
}

#[async_trait]
impl EventStore for StorageBackend {
    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        match self {
            Self::Postgres(db) => {
                let row = db
                    .create_event(CreateEventRow {
                        id: Uuid::now_v7(),
                        device_id: event.device_id,
                        event_type: event.event_type,
                        raw_payload: event.raw_payload,
                    })
                    .await
                    .map_err(store_err)?;
                Ok(row.into())
            }
            Self::InMemory(store) => store.insert_event(event).await,
        }
    }

    async fn mark_notified(&self, event_id: Uuid, responder_ids: &[Uuid]) -> Result<Event> {
        match self {
            Self::Postgres(db) => {
                if responder_ids.is_empty() {
                    return Err(OutreachError::validation(
                        "an event cannot be notified without matched responders",
                    ));
                }
                db.mark_event_notified(event_id, responder_ids)
                    .await
                    .map_err(store_err)?
                    .map(Event::from)
                    .ok_or(OutreachError::EventNotFound(event_id))
            }
            Self::InMemory(store) => store.mark_notified(event_id, responder_ids).await,
        }
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
        match self {
            Self::Postgres(db) => Ok(db
                .get_event(event_id)
                .await
                .map_err(store_err)?
                .map(Event::from)),
            Self::InMemory(store) => store.get_event(event_id).await,
        }
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<Event>> {
        match self {
            Self::Postgres(db) => {
                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let rows = db.list_events(limit).await.map_err(store_err)?;
                Ok(rows.into_iter().map(Event::from).collect())
            }
            Self::InMemory(store) => store.list_events(limit).await,
        }
    }

    async fn clear_events(&self) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_all_events().await.map_err(store_err),
            Self::InMemory(store) => store.clear_events().await,
        }
    }

    async fn stats(&self) -> Result<Stats> {
        match self {
            Self::Postgres(db) => {
                let row = db.stats().await.map_err(store_err)?;
                Ok(Stats {
                    total_events: row.total_events.max(0) as u64,
                    total_responders: row.total_responders.max(0) as u64,
                    active_alerts: row.active_alerts.max(0) as u64,
                })
            }
            Self::InMemory(store) => store.stats().await,
        }
    }
}

#[async_trait]
impl ResponderStore for StorageBackend {
    async fn create_responder(&self, responder: NewResponder) -> Result<Responder> {
        match self {
            Self::Postgres(db) => {
                let (lat, lon) = match responder.location {
                    Some(point) => (Some(point.lat), Some(point.lon)),
                    None => (None, None),
                };
                let row = db
                    .create_responder(CreateResponderRow {
                        id: Uuid::now_v7(),
                        name: responder.name,
                        phone: responder.phone,
                        email: responder.email,
                        lat,
                        lon,
                        services: responder.services,
                    })
                    .await
                    .map_err(store_err)?;
                Ok(row.into())
            }
            Self::InMemory(store) => store.create_responder(responder).await,
        }
    }

    async fn list_responders(&self) -> Result<Vec<Responder>> {
        match self {
            Self::Postgres(db) => {
                let rows = db.list_responders().await.map_err(store_err)?;
                Ok(rows.into_iter().map(Responder::from).collect())
            }
            Self::InMemory(store) => store.list_responders().await,
        }
    }
}

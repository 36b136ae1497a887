// Responder service: validation and registration

use outreach_core::{NewResponder, OutreachError, Responder, ResponderStore, Result};
use std::sync::Arc;

use crate::api::responders::CreateResponderRequest;

pub struct ResponderService {
    store: Arc<dyn ResponderStore>,
}

impl ResponderService {
    pub fn new(store: Arc<dyn ResponderStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateResponderRequest) -> Result<Responder> {
        let input = req.into_new_responder()?;
        let responder = self.store.create_responder(input).await?;
        tracing::info!(responder_id = %responder.id, name = %responder.name, "Added responder");
        Ok(responder)
    }

    pub async fn list(&self) -> Result<Vec<Responder>> {
        self.store.list_responders().await
    }
}

impl CreateResponderRequest {
    /// Validate and normalize into a store input
    pub fn into_new_responder(self) -> Result<NewResponder> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| OutreachError::validation("name is required"))?;

        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(outreach_core::GeoPoint { lat, lon }),
            _ => None,
        };

        Ok(NewResponder {
            name,
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            location,
            services: self.services.map(|s| s.into_tags()).unwrap_or_default(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Domain event publishing over NATS.

use crate::domain::events::DomainEvent;

/// Publishes events to NATS when a client is configured, otherwise logs them.
/// Publishing never fails the operation that raised the event.
#[derive(Clone, Default)]
pub struct EventPublisher { nats: Option<async_nats::Client> }

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }
    pub fn disabled() -> Self { Self::default() }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.publish(&event).await;
        }
    }

    pub async fn publish(&self, event: &DomainEvent) {
        let Some(client) = &self.nats else {
            tracing::debug!(subject = event.subject(), ?event, "Domain event (no NATS client)");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(subject = event.subject(), error = %e, "Could not encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(subject = event.subject(), error = %e, "Failed to publish domain event");
        }
    }
}

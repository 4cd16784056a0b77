//! Domain event fan-out to NATS

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

/// Publishes domain events when a NATS client is configured; otherwise the
/// events are only traced.
#[derive(Clone, Default)]
pub struct EventBus {
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }
    pub fn disabled() -> Self { Self::default() }
    pub fn is_connected(&self) -> bool { self.nats.is_some() }

    /// Delivery is best effort; a failed publish never fails the request.
    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        debug!(%subject, ?event, "domain event");
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%subject, error = %e, "failed to encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!(%subject, error = %e, "failed to publish domain event");
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("connected", &self.is_connected()).finish()
    }
}

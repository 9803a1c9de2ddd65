//! Inbound delivery routing.
//!
//! The gateway verifies a delivery, finds every room bound to the event's
//! repository and fans the notification out to those that want the event
//! type. A delivery for a repository no room references comes from an
//! orphaned hook; the gateway deletes it so the provider stops sending.

use std::sync::Arc;

use hookbridge_core::{
    bindings_matching, BridgeConfig, BridgeResult, ChatClient, ConfigStore, CredentialResolver,
    RepoName,
};

use tracing::Instrument;

use crate::lifecycle::HookLifecycleManager;
use crate::receiver::{DeliveryVerifier, InboundDelivery, InboundRequest, VerifiedRequest};

/// Outcome of sending to one room.
#[derive(Debug)]
pub struct RoomDelivery {
    pub room_id: String,
    pub result: BridgeResult<()>,
}

/// What happened while routing one delivery.
#[derive(Debug, Default)]
pub struct RoutingReport {
    pub event_type: Option<String>,
    pub repo: Option<String>,
    /// Rooms bound to the repository, whether or not they wanted the event.
    pub matched_rooms: usize,
    /// Send attempts, one per room that wanted the event.
    pub deliveries: Vec<RoomDelivery>,
    /// Orphaned-hook deletion result, if one was attempted.
    pub cleanup: Option<BridgeResult<u64>>,
}

impl RoutingReport {
    /// Returns the rooms a notification was successfully sent to.
    pub fn notified_rooms(&self) -> Vec<&str> {
        self.deliveries
            .iter()
            .filter(|d| d.result.is_ok())
            .map(|d| d.room_id.as_str())
            .collect()
    }
}

/// Response to an inbound delivery.
#[derive(Debug)]
pub struct GatewayResponse {
    /// HTTP status for the provider.
    pub status: u16,
    pub report: RoutingReport,
}

impl GatewayResponse {
    fn new(status: u16, report: RoutingReport) -> Self {
        Self { status, report }
    }
}

/// Routes provider deliveries to chat rooms.
pub struct WebhookGateway {
    verifier: Arc<dyn DeliveryVerifier>,
    chat: Arc<dyn ChatClient>,
    credentials: Arc<dyn CredentialResolver>,
    store: Arc<dyn ConfigStore>,
}

impl WebhookGateway {
    /// Creates a new gateway.
    pub fn new(
        verifier: Arc<dyn DeliveryVerifier>,
        chat: Arc<dyn ChatClient>,
        credentials: Arc<dyn CredentialResolver>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            verifier,
            chat,
            credentials,
            store,
        }
    }

    /// Loads the configuration `config_id` and routes the request against it.
    ///
    /// Unknown configurations answer 404; storage failures answer 500.
    pub async fn handle_for(&self, config_id: &str, request: &InboundRequest) -> GatewayResponse {
        match self.store.get(config_id).await {
            Ok(Some(config)) => self.handle(&config, request).await,
            Ok(None) => {
                tracing::warn!(service_id = %config_id, "Received webhook for unknown service");
                GatewayResponse::new(404, RoutingReport::default())
            }
            Err(e) => {
                tracing::error!(service_id = %config_id, error = %e, "Failed to load service");
                GatewayResponse::new(e.status_code(), RoutingReport::default())
            }
        }
    }

    /// Routes a request against a configuration snapshot.
    pub async fn handle(&self, config: &BridgeConfig, request: &InboundRequest) -> GatewayResponse {
        let delivery = match self.verifier.verify(request, config.secret()) {
            Ok(VerifiedRequest::Event(delivery)) => delivery,
            Ok(VerifiedRequest::Ping) => {
                tracing::debug!(service_id = %config.id, "Acknowledged ping");
                return GatewayResponse::new(200, RoutingReport::default());
            }
            Err(e) => {
                tracing::debug!(service_id = %config.id, error = %e, "Rejected delivery");
                return GatewayResponse::new(e.status_code(), RoutingReport::default());
            }
        };

        let span = tracing::info_span!(
            "webhook",
            event = %delivery.event_type,
            repo = %delivery.repo_full_name,
            delivery_id = delivery.delivery_id.as_deref().unwrap_or("-"),
        );
        self.route(config, &delivery).instrument(span).await
    }

    async fn route(&self, config: &BridgeConfig, delivery: &InboundDelivery) -> GatewayResponse {
        let mut report = RoutingReport {
            event_type: Some(delivery.event_type.clone()),
            repo: Some(delivery.repo_full_name.clone()),
            ..Default::default()
        };

        let bindings = bindings_matching(config, &delivery.repo_full_name);
        report.matched_rooms = bindings.len();

        if bindings.is_empty() {
            let repo = match RepoName::parse(&delivery.repo_full_name) {
                Ok(repo) => repo,
                Err(_) => {
                    tracing::error!("Received event with malformed owner/repo");
                    return GatewayResponse::new(400, report);
                }
            };

            let lifecycle = HookLifecycleManager::for_config(config, self.credentials.clone());
            let result = lifecycle.delete(&repo.owner, &repo.name).await;
            match &result {
                Ok(_) => tracing::info!("Deleted webhook"),
                Err(e) => tracing::warn!(error = %e, "Failed to delete webhook"),
            }
            report.cleanup = Some(result);
            return GatewayResponse::new(200, report);
        }

        for binding in bindings {
            if !binding.repo.wants(&delivery.event_type) {
                continue;
            }

            tracing::info!(room_id = %binding.room_id, "Sending notification to room");
            let result = self
                .chat
                .send_message(binding.room_id, &delivery.notification)
                .await;
            if let Err(e) = &result {
                tracing::warn!(room_id = %binding.room_id, error = %e, "Failed to send notification to room");
            }
            report.deliveries.push(RoomDelivery {
                room_id: binding.room_id.to_string(),
                result,
            });
        }

        GatewayResponse::new(200, report)
    }
}

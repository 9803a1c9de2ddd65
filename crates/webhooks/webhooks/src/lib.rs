//! # Hookbridge Webhooks
//!
//! Keeps provider hooks in sync with room bindings and routes inbound
//! deliveries to the rooms that asked for them:
//! - Idempotent hook create/delete keyed by callback URL
//! - Two-phase reconciliation with self-pruning of empty configurations
//! - Signature-verified inbound routing with orphaned-hook cleanup
//! - A service manager serializing changes per configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use hookbridge_webhooks::{GithubDeliveryVerifier, ServiceManager, WebhookGateway};
//!
//! let manager = ServiceManager::new(credentials.clone(), store.clone(), chat.clone());
//! manager.configure(config).await?;
//!
//! let gateway = WebhookGateway::new(Arc::new(GithubDeliveryVerifier::new()), chat, credentials, store);
//! let response = gateway.handle_for("svc-1", &request).await;
//! ```

mod gateway;
mod lifecycle;
mod manager;
mod payload;
mod receiver;
mod reconcile;
mod render;
mod signature;
#[cfg(feature = "http-client")]
pub mod github;

pub use gateway::{GatewayResponse, RoomDelivery, RoutingReport, WebhookGateway};
pub use lifecycle::{HookCreation, HookLifecycleManager};
pub use manager::{ConfigureOutcome, ServiceManager};
pub use payload::EventPayload;
pub use receiver::{
    DeliveryVerifier, GithubDeliveryVerifier, InboundDelivery, InboundRequest, VerifiedRequest,
    DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER,
};
pub use reconcile::{HookRemoval, PostRegisterReport, ReconciliationEngine, RegisterReport};
pub use render::render_notification;
pub use signature::{PayloadSigner, SignatureError};
#[cfg(feature = "http-client")]
pub use github::GithubClient;

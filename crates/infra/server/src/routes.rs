//! HTTP routes for inbound deliveries and service administration.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use hookbridge_core::{BridgeConfig, BridgeError, RoomBinding};
use hookbridge_webhooks::{InboundRequest, ServiceManager, WebhookGateway};

use crate::config::ServerConfig;

/// Shared state for the routes.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<WebhookGateway>,
    pub manager: Arc<ServiceManager>,
    pub server: Arc<ServerConfig>,
}

/// Creates the router with every hookbridge route.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/services/hooks/{id}", post(hook_handler))
        .route("/admin/configureService", post(configure_handler))
        .with_state(state)
}

/// Request body for creating or replacing a service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRequest {
    pub id: String,
    #[serde(default)]
    pub realm_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub secret_token: String,
    #[serde(default)]
    pub rooms: HashMap<String, RoomBinding>,
}

impl ServiceRequest {
    fn into_config(self, callback_url: String) -> BridgeConfig {
        BridgeConfig {
            id: self.id,
            callback_url,
            realm_id: self.realm_id,
            user_id: self.user_id,
            secret_token: self.secret_token,
            rooms: self.rooms,
        }
    }
}

/// Response body after a service was configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    /// The configuration that was replaced, if any.
    pub old: Option<BridgeConfig>,
    /// The configuration now in effect.
    pub new: BridgeConfig,
    pub created: Vec<String>,
    pub already_existing: Vec<String>,
    pub removed: Vec<String>,
    pub failed_removals: Vec<String>,
    pub pruned: bool,
}

/// Error rendered as a JSON body with the matching status.
#[derive(Debug)]
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status(self.0.status_code());
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "code": status.as_u16()
        });
        (status, Json(body)).into_response()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn hook_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let mut request = InboundRequest::new(body.to_vec());
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    let response = state.gateway.handle_for(&id, &request).await;
    status(response.status)
}

async fn configure_handler(
    State(state): State<AppState>,
    Json(request): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    if request.id.is_empty() {
        return Err(BridgeError::config("id is required").into());
    }

    let callback_url = state.server.callback_url(&request.id);
    let outcome = state.manager.configure(request.into_config(callback_url)).await?;

    Ok(Json(ServiceResponse {
        old: outcome.old,
        new: outcome.new,
        created: outcome.register.created,
        already_existing: outcome.register.already_existing,
        failed_removals: outcome
            .post_register
            .failed_removals()
            .into_iter()
            .map(String::from)
            .collect(),
        removed: outcome
            .post_register
            .removals
            .into_iter()
            .filter(|r| r.result.is_ok())
            .map(|r| r.repo)
            .collect(),
        pruned: outcome.post_register.pruned,
    }))
}

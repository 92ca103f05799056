// HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::middleware::{auth_middleware, Caller};
use super::MindServer;
use crate::errors::ServiceError;
use crate::services::{
    AnalyzeEntryRequest, AnalyzeEntryResponse, ChatbotProxyRequest, ChatbotProxyResponse,
};

/// Create the main application router
pub fn create_router(server: Arc<MindServer>) -> Router {
    Router::new()
        // Callable operations
        .route("/analyzeEntry", post(analyze_entry))
        .route("/chatbotProxy", post(chatbot_proxy))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&server),
            auth_middleware,
        ))
        // Health
        .route("/health", get(health_check))
        .with_state(server)
}

/// Callable request envelope: `{"data": {...}}`
#[derive(Debug, Deserialize)]
pub struct CallableRequest<T> {
    #[serde(default)]
    pub data: T,
}

/// Callable response envelope: `{"result": {...}}`
#[derive(Debug, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

fn decode<T>(payload: Result<Json<CallableRequest<T>>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(request)) => Ok(request.data),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected callable payload");
            Err(AppError(ServiceError::invalid_argument(
                "Request body must be a JSON object with a data field",
            )))
        }
    }
}

/// Handle POST /analyzeEntry
async fn analyze_entry(
    State(server): State<Arc<MindServer>>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<CallableRequest<AnalyzeEntryRequest>>, JsonRejection>,
) -> Result<Json<CallableResponse<AnalyzeEntryResponse>>, AppError> {
    let request = decode(payload)?;
    let result = server
        .analysis()
        .analyze_entry(caller.as_ref(), request)
        .await?;

    Ok(Json(CallableResponse { result }))
}

/// Handle POST /chatbotProxy
async fn chatbot_proxy(
    State(server): State<Arc<MindServer>>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<CallableRequest<ChatbotProxyRequest>>, JsonRejection>,
) -> Result<Json<CallableResponse<ChatbotProxyResponse>>, AppError> {
    let request = decode(payload)?;
    let result = server.chat().chatbot_proxy(caller.as_ref(), request).await?;

    Ok(Json(CallableResponse { result }))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub gateway: String,
}

/// Handle GET /health - Health check endpoint
pub async fn health_check(State(server): State<Arc<MindServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gateway: server.gateway_name().to_string(),
    })
}

/// Application error wrapper for callable error responses
#[derive(Debug)]
pub struct AppError(pub ServiceError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal errors were already logged with detail by the service
        if !matches!(self.0, ServiceError::Internal(_)) {
            tracing::debug!(status = self.0.status(), "Request rejected");
        }

        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": {
                "status": self.0.status(),
                "message": self.0.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

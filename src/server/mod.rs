// MindMitra - HTTP server module
// Exposes the two callable operations over HTTP

mod handlers;
mod middleware;

pub use handlers::{create_router, health_check, AppError, CallableRequest, CallableResponse};
pub use middleware::{auth_middleware, Caller};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{IdentityProvider, StaticTokenVerifier};
use crate::config::{Config, ServerConfig, StorageConfig};
use crate::crisis::CrisisDetector;
use crate::providers::create_gateway;
use crate::services::{AnalysisService, ChatService};
use crate::store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};

/// Main server structure
pub struct MindServer {
    analysis: Arc<AnalysisService>,
    chat: Arc<ChatService>,
    identity: Arc<dyn IdentityProvider>,
    /// Provider name reported by /health
    gateway_name: String,
    config: ServerConfig,
}

impl MindServer {
    /// Create a server from already built components
    pub fn new(
        config: ServerConfig,
        analysis: AnalysisService,
        chat: ChatService,
        identity: Arc<dyn IdentityProvider>,
        gateway_name: impl Into<String>,
    ) -> Self {
        Self {
            analysis: Arc::new(analysis),
            chat: Arc::new(chat),
            identity,
            gateway_name: gateway_name.into(),
            config,
        }
    }

    /// Build gateway, store, detector, and identity provider from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = create_gateway(&config.provider)?;

        let store: Arc<dyn DocumentStore> = match &config.storage {
            StorageConfig::Memory => {
                tracing::warn!("Using in-memory document store; data is lost on restart");
                Arc::new(MemoryDocumentStore::new())
            }
            StorageConfig::File { data_dir } => Arc::new(
                FileDocumentStore::new(data_dir)
                    .with_context(|| format!("Failed to open data dir {}", data_dir.display()))?,
            ),
        };

        let detector = match &config.crisis_keywords_path {
            Some(path) => CrisisDetector::load_from_file(path)?,
            None => CrisisDetector::default(),
        };

        let identity = Arc::new(StaticTokenVerifier::new(config.server.auth_tokens.clone()));
        let gateway_name = gateway.name().to_string();

        Ok(Self::new(
            config.server.clone(),
            AnalysisService::new(Arc::clone(&gateway), Arc::clone(&store), detector),
            ChatService::new(gateway, store),
            identity,
            gateway_name,
        ))
    }

    /// Start the HTTP server and run until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;
        let cors_enabled = self.config.cors_enabled;

        // Build router
        let mut app = create_router(Arc::new(self)).layer(TraceLayer::new_for_http());
        if cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }

        tracing::info!("Starting MindMitra server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    pub fn analysis(&self) -> &Arc<AnalysisService> {
        &self.analysis
    }

    pub fn chat(&self) -> &Arc<ChatService> {
        &self.chat
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn gateway_name(&self) -> &str {
        &self.gateway_name
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

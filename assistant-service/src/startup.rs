//! Application startup and lifecycle management.
//!
//! Builds the HTTP gateway: `/api/*` routes behind per-IP rate limiting,
//! the static front end for everything else, and the cross-cutting layers
//! (CORS, security headers, body limit, request ids, tracing, panic capture).

use crate::config::AssistantConfig;
use crate::handlers::{
    api_not_found,
    chat::{chat, test_connection},
    health::health_check,
};
use crate::middleware::cors_layer;
use crate::services::providers::anthropic::AnthropicProvider;
use crate::services::providers::ChatProvider;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    create_ip_rate_limiter, ip_rate_limit_middleware, request_id_middleware,
    security_headers_middleware, REQUEST_ID_HEADER,
};
use std::any::Any;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ChatProvider>,
    pub started_at: Instant,
    pub log_conversations: bool,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>, config: &AssistantConfig) -> Self {
        Self {
            provider,
            started_at: Instant::now(),
            log_conversations: config.gateway.log_conversations,
        }
    }
}

/// Build the full router for the given state and configuration.
pub fn build_router(state: AppState, config: &AssistantConfig) -> Router {
    let ip_limiter = create_ip_rate_limiter(
        config.gateway.rate_limit_max,
        config.gateway.rate_limit_window_secs,
        config.gateway.trust_proxy,
    );

    let api = Router::new()
        .route("/chat", post(chat))
        .route("/chat/test", get(test_connection))
        .route("/health", get(health_check))
        .fallback(api_not_found)
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware));

    let static_dir = PathBuf::from(&config.gateway.static_dir);
    let frontend =
        ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let expose_details = config.common.environment.exposes_error_details();

    Router::new()
        .nest("/api", api)
        .fallback_service(frontend)
        .layer(DefaultBodyLimit::max(config.gateway.body_limit_bytes))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(config))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, expose_details)
        }))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Last-resort handler for panics inside request handling.
fn panic_response(panic: Box<dyn Any + Send + 'static>, expose_details: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");
    AppError::internal_with_details(detail, expose_details).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against the real Anthropic API.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let provider = AnthropicProvider::new(config.anthropic.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            model = %config.anthropic.model,
            base_url = %config.anthropic.base_url,
            timeout_secs = config.anthropic.timeout_secs,
            "Initialized Anthropic provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application with an explicit provider (tests inject mocks here).
    pub async fn build_with_provider(
        config: AssistantConfig,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(provider, &config);
        let router = build_router(state, &config);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            environment = ?config.common.environment,
            static_dir = %config.gateway.static_dir,
            "Assistant service listening"
        );

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

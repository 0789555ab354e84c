//! MCP server runtime: lifecycle and transports

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use neo4j_mcp_config::ResolvedConfig;
use neo4j_mcp_core::{ConnectionReport, Neo4jMcpError, NormalizedError};
use neo4j_mcp_types::Transport;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::connectors::{ConnectionManager, ConnectorFactory};
use crate::handlers::McpHandler;
use crate::state::AppState;

/// Runtime server for neo4j-mcp
pub struct Runtime {
    config: ResolvedConfig,
    connections: Arc<ConnectionManager>,
    state: AppState,
}

impl Runtime {
    /// Create a runtime; nothing connects until [`Runtime::start`]
    pub fn new(config: ResolvedConfig, factory: Arc<dyn ConnectorFactory>) -> Self {
        let connections = Arc::new(ConnectionManager::new(factory));
        let state = AppState::new(connections.clone(), config.descriptor.clone());
        Self {
            config,
            connections,
            state,
        }
    }

    /// Connect to Neo4j and verify connectivity
    pub async fn start(&self) -> Result<(), NormalizedError> {
        self.connections.start(self.config.descriptor.clone()).await
    }

    /// Start, serve the configured transport until shutdown, then stop
    pub async fn run(&self) -> Result<(), Neo4jMcpError> {
        self.start().await?;

        let served = match self.config.transport {
            Transport::Stdio => self.serve_stdio().await,
            Transport::Http => self.serve_http().await,
        };

        self.shutdown().await;
        served
    }

    /// Start, test the connection and stop; never fails
    pub async fn check(&self) -> ConnectionReport {
        if let Err(err) = self.start().await {
            return ConnectionReport::failure(
                self.config.descriptor.database(),
                self.config.descriptor.auth_enabled(),
                err,
            );
        }
        let report = self.state.diagnostics.test_connection().await;
        self.shutdown().await;
        report
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout
    pub async fn serve_stdio(&self) -> Result<(), Neo4jMcpError> {
        info!("Serving MCP over stdio");
        let mut stdout = tokio::io::stdout();
        self.serve_io(tokio::io::stdin(), &mut stdout, Self::shutdown_signal())
            .await
    }

    /// Serve newline-delimited JSON-RPC over any byte stream
    ///
    /// Each request runs as its own task and replies are written as they
    /// complete. Reading stops at end of input or when `shutdown` resolves;
    /// requests already received still get their replies.
    pub async fn serve_io<R, W, S>(
        &self,
        reader: R,
        writer: &mut W,
        shutdown: S,
    ) -> Result<(), Neo4jMcpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = BufReader::new(reader).lines();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let state = self.state.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            if let Some(reply) = McpHandler::dispatch_line(&state, &line).await {
                                let _ = tx.send(reply);
                            }
                        });
                    }
                    None => {
                        debug!("Input closed");
                        break;
                    }
                },
                Some(reply) = rx.recv() => write_line(writer, &reply).await?,
                _ = &mut shutdown => break,
            }
        }

        drop(tx);
        while let Some(reply) = rx.recv().await {
            write_line(writer, &reply).await?;
        }
        Ok(())
    }

    /// Build the Axum router
    fn build_router(&self) -> Router {
        // CORS configuration
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        // Request timeout
        let timeout = TimeoutLayer::new(self.config.request_timeout);

        Router::new()
            // MCP endpoints
            .route(
                "/mcp",
                post(McpHandler::handle_rpc).delete(McpHandler::handle_delete),
            )
            // Health check
            .route("/health", get(Self::health_check))
            // State
            .with_state(self.state.clone())
            // Middleware
            .layer(cors)
            .layer(timeout)
            .layer(TraceLayer::new_for_http())
    }

    /// Health check endpoint
    async fn health_check(State(state): State<AppState>) -> Json<Value> {
        let connected = state.executor.connections().is_started().await;
        Json(json!({
            "status": "ok",
            "connected": connected,
            "database": state.descriptor.database()
        }))
    }

    /// Serve MCP over HTTP
    pub async fn serve_http(&self) -> Result<(), Neo4jMcpError> {
        let host = self.config.server_host.as_str();
        let port = self.config.server_port;
        let app = self.build_router();

        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            Neo4jMcpError::Server(format!("Failed to bind {}:{}: {}", host, port, e))
        })?;

        info!("MCP endpoint: http://{}:{}/mcp", host, port);
        info!("Health check: http://{}:{}/health", host, port);

        axum::serve(listener, app)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await
            .map_err(|e| Neo4jMcpError::Server(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Wait for shutdown signal
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for CTRL+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                debug!("Received CTRL+C, shutting down...");
            }
            _ = terminate => {
                debug!("Received SIGTERM, shutting down...");
            }
        }
    }

    /// Gracefully shutdown the runtime
    pub async fn shutdown(&self) {
        info!("Closing Neo4j connection...");
        self.connections.stop().await;
        info!("Shutdown complete");
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

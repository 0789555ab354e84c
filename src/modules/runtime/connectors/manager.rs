//! Connection manager owning the live Neo4j connector

use neo4j_mcp_core::{
    normalize, ConnectionDescriptor, DriverFailure, ErrorKind, NormalizedError, RawResult,
    Redactor, ServerInfo, Statement,
};
use neo4j_mcp_types::AccessMode;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::traits::{Connector, ConnectorFactory, Session};

/// State present between `start` and `stop`
struct LiveConnection {
    connector: Arc<dyn Connector>,
    /// One permit per concurrently borrowed session
    permits: Arc<Semaphore>,
    descriptor: ConnectionDescriptor,
    redactor: Arc<Redactor>,
}

/// A session lent to one unit of work
///
/// Failures are normalized on the way out, so work closures only ever see
/// [`NormalizedError`].
pub struct ScopedSession<'a> {
    inner: &'a mut Box<dyn Session>,
    database: &'a str,
    mode: AccessMode,
    redactor: &'a Redactor,
}

impl ScopedSession<'_> {
    pub fn run(&mut self, statement: &Statement) -> Result<RawResult, NormalizedError> {
        self.inner
            .run(statement)
            .map_err(|failure| normalize(&failure, self.redactor))
    }

    pub fn server_info(&mut self) -> Result<ServerInfo, NormalizedError> {
        self.inner
            .server_info()
            .map_err(|failure| normalize(&failure, self.redactor))
    }

    /// Database this session is bound to
    pub fn database(&self) -> &str {
        self.database
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

/// Owns the connector and bounds the number of live sessions
pub struct ConnectionManager {
    factory: Arc<dyn ConnectorFactory>,
    live: RwLock<Option<Arc<LiveConnection>>>,
}

impl ConnectionManager {
    pub fn new(factory: Arc<dyn ConnectorFactory>) -> Self {
        Self {
            factory,
            live: RwLock::new(None),
        }
    }

    /// Build the connector from `descriptor` and verify connectivity
    ///
    /// A no-op when already started.
    pub async fn start(&self, descriptor: ConnectionDescriptor) -> Result<(), NormalizedError> {
        let mut live = self.live.write().await;
        if live.is_some() {
            debug!("Connection manager already started");
            return Ok(());
        }

        let redactor = Arc::new(descriptor.redactor());
        info!(
            uri = %redactor.redact(&descriptor.bolt_uri()),
            database = descriptor.database(),
            auth = descriptor.auth_enabled(),
            "Connecting to Neo4j"
        );

        let factory = self.factory.clone();
        let target = descriptor.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            let connector = factory.connect(&target)?;
            if let Err(failure) = connector.verify() {
                let _ = connector.close();
                return Err(failure);
            }
            Ok(connector)
        });

        let outcome = timeout(descriptor.connection_timeout(), &mut task).await;
        let connector = match outcome {
            Ok(Ok(Ok(connector))) => connector,
            Ok(Ok(Err(failure))) => {
                let err = normalize(&failure, &redactor);
                warn!("Failed to connect to Neo4j: {}", err);
                return Err(err);
            }
            Ok(Err(e)) => {
                return Err(NormalizedError::new(
                    ErrorKind::Unknown,
                    format!("Connection worker failed: {}", e),
                ))
            }
            Err(_) => {
                // The blocking connect cannot be interrupted; close whatever it
                // produces once it returns
                tokio::spawn(async move {
                    if let Ok(Ok(connector)) = task.await {
                        debug!("Closing Neo4j connector that finished after the timeout");
                        let _ = tokio::task::spawn_blocking(move || connector.close()).await;
                    }
                });
                let failure = DriverFailure::Timeout(format!(
                    "no answer from {} within {}s",
                    descriptor.bolt_uri(),
                    descriptor.connection_timeout().as_secs()
                ));
                let err = normalize(&failure, &redactor);
                warn!("Failed to connect to Neo4j: {}", err);
                return Err(err);
            }
        };

        let permits = descriptor.max_pool_size().min(Semaphore::MAX_PERMITS);
        *live = Some(Arc::new(LiveConnection {
            connector,
            permits: Arc::new(Semaphore::new(permits)),
            descriptor,
            redactor,
        }));

        info!(max_sessions = permits, "Connected to Neo4j");
        Ok(())
    }

    /// Release the connector and refuse further work; idempotent
    ///
    /// Sessions already borrowed run to completion.
    pub async fn stop(&self) {
        let Some(live) = self.live.write().await.take() else {
            debug!("Connection manager already stopped");
            return;
        };

        live.permits.close();
        let connector = live.connector.clone();
        match tokio::task::spawn_blocking(move || connector.close()).await {
            Ok(Ok(())) => info!("Closed Neo4j connection"),
            Ok(Err(failure)) => warn!(
                "Error closing Neo4j connection: {}",
                normalize(&failure, &live.redactor)
            ),
            Err(e) => warn!("Error closing Neo4j connection: {}", e),
        }
    }

    pub async fn is_started(&self) -> bool {
        self.live.read().await.is_some()
    }

    /// Sessions that can be borrowed right now without waiting
    pub async fn available_sessions(&self) -> Option<usize> {
        self.live
            .read()
            .await
            .as_ref()
            .map(|live| live.permits.available_permits())
    }

    /// Borrow a session for the duration of `work`
    ///
    /// `work` runs on the blocking worker pool. The session is committed when
    /// `work` succeeds in write mode and rolled back in every other case. The
    /// session and its pool slot are released on every exit path, including
    /// a panic in `work` or the caller dropping the returned future.
    pub async fn with_session<T, F>(
        &self,
        database: Option<&str>,
        mode: AccessMode,
        work: F,
    ) -> Result<T, NormalizedError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ScopedSession<'_>) -> Result<T, NormalizedError> + Send + 'static,
    {
        let live = self
            .live
            .read()
            .await
            .clone()
            .ok_or_else(NormalizedError::not_started)?;

        let wait = live.descriptor.acquire_timeout();
        let permit = match timeout(wait, live.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(NormalizedError::not_started()),
            Err(_) => {
                warn!(waited_ms = wait.as_millis() as u64, "Session pool exhausted");
                return Err(NormalizedError::pool_exhausted(wait));
            }
        };

        let database = database
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| live.descriptor.database().to_string());
        let connector = live.connector.clone();
        let redactor = live.redactor.clone();

        let mut task = tokio::task::spawn_blocking(move || {
            let _permit = permit;

            let mut session = connector
                .open_session(&database, mode)
                .map_err(|failure| normalize(&failure, &redactor))?;

            let outcome = {
                let mut scoped = ScopedSession {
                    inner: &mut session,
                    database: &database,
                    mode,
                    redactor: &redactor,
                };
                work(&mut scoped)
            };

            match outcome {
                Ok(value) => {
                    session
                        .finish(mode == AccessMode::Write)
                        .map_err(|failure| normalize(&failure, &redactor))?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(failure) = session.finish(false) {
                        debug!("Rollback after failure also failed: {}", failure);
                    }
                    Err(err)
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(NormalizedError::new(
                ErrorKind::Unknown,
                "Query worker panicked; its session was released",
            )),
            Err(_) => Err(NormalizedError::new(
                ErrorKind::Unknown,
                "Query worker was cancelled",
            )),
        }
    }
}

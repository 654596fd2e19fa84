//! `SketchServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport → JSON codec → room
//! registry → one actor per room.

use std::sync::Arc;
use std::time::Duration;

use sketchturn_protocol::{Codec, JsonCodec};
use sketchturn_room::{GameConfig, SessionRegistry};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::transport::WebSocketListener;
use crate::{ServerConfig, SketchError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) codec: C,
    pub(crate) join_timeout: Duration,
}

/// Builder for configuring and starting a Sketchturn server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), sketchturn::SketchError> {
/// use sketchturn::SketchServer;
///
/// let server = SketchServer::builder().bind("0.0.0.0:8080").build().await?;
/// server.run().await
/// # }
/// ```
pub struct SketchServerBuilder {
    config: ServerConfig,
}

impl SketchServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once, e.g. with
    /// [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = timeout;
        self
    }

    /// Validates the game settings, binds the listener, and returns a
    /// server speaking JSON.
    pub async fn build(self) -> Result<SketchServer<JsonCodec>, SketchError> {
        let registry = SessionRegistry::new(self.config.game)?;
        let listener = WebSocketListener::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            codec: JsonCodec,
            join_timeout: self.config.join_timeout,
        });

        Ok(SketchServer { listener, state })
    }
}

impl Default for SketchServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sketchturn server. Call [`run()`](Self::run) to start accepting
/// connections.
pub struct SketchServer<C: Codec = JsonCodec> {
    listener: WebSocketListener,
    state: Arc<ServerState<C>>,
}

impl SketchServer<JsonCodec> {
    pub fn builder() -> SketchServerBuilder {
        SketchServerBuilder::new()
    }
}

impl<C: Codec> SketchServer<C> {
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and spawns a handler task for each. Runs until
    /// the future is dropped.
    pub async fn run(self) -> Result<(), SketchError> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`run`](Self::run), but once `shutdown` resolves the listener
    /// is closed and every room actor is stopped.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), SketchError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Sketchturn server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, state).await {
                                tracing::debug!(%addr, error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.registry.lock().await.shutdown_all().await;
        tracing::info!("Sketchturn server stopped");
        Ok(())
    }
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
};
use tower_http::services::ServeDir;

use crate::{routes, BroadcastConsole};

/// Outbound messages buffered per connected console before it starts lagging.
const UPDATE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub port: u16,
    /// Directory with the console page and its assets.
    pub static_dir: PathBuf,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            port: 5555,
            static_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("static"),
        }
    }
}

pub struct ServerState {
    pub(crate) updates: broadcast::Sender<String>,
    pub(crate) commands: mpsc::UnboundedSender<String>,
}

/// The match loop's end of the console bridge.
pub struct ConsoleBridge {
    state: Arc<ServerState>,
    commands: mpsc::UnboundedReceiver<String>,
}

impl ConsoleBridge {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(ServerState {
                updates,
                commands: commands_tx,
            }),
            commands,
        }
    }

    /// A console sink feeding every connected browser.
    pub fn console(&self) -> BroadcastConsole {
        BroadcastConsole::new(self.state.updates.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.state.updates.subscribe()
    }

    /// The oldest command not yet handled. Never blocks.
    pub fn try_next_command(&mut self) -> Option<String> {
        let command = self.commands.try_recv().ok()?;
        let backlog = self.commands.len();
        if backlog > 0 {
            log::debug!("{} console commands waiting", backlog);
        }
        Some(command)
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }
}

impl Default for ConsoleBridge {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: Arc<ServerState>, static_dir: impl AsRef<Path>) -> Router {
    let serve_dir = ServeDir::new(static_dir.as_ref());
    Router::new()
        .route("/api/ws", get(routes::websocket))
        .route("/api/command", post(routes::post_command))
        .fallback_service(serve_dir)
        .with_state(state)
}

/// Bind the configured port and serve until `shutdown_rx` fires.
pub async fn start(
    config: UiConfig,
    bridge_state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind webui port {}", config.port))?;
    let app = router(bridge_state, &config.static_dir);
    serve(listener, app, shutdown_rx).await
}

pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let port = listener.local_addr().context("Webui listener has no address")?.port();
    log::info!("Webui running at http://localhost:{}", port);
    let shutdown_fut = async move {
        let _ = shutdown_rx.recv().await;
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_fut)
        .await
        .context("Webui server failed")?;
    log::debug!("Webui has shut down");
    Ok(())
}

use crate::channels::telegram::TelegramChannel;
use crate::channels::{BotContext, MediaFetcher};
use crate::cli::ServeOpts;
use crate::config::{validate_config_object, Config};
use crate::gateway::routes;
use crate::index::IndexStore;
use crate::sessions::PendingUploadTracker;

use anyhow::{Context, Result};
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use url::Url;

/// How long the caption endpoint waits for the media download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<IndexStore>,
    pub pending: Arc<PendingUploadTracker>,
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Path the caption route is mounted under, without a trailing slash.
    pub caption_mount: String,
    pub fetch_timeout: Duration,
    pub shutdown_tx: broadcast::Sender<()>,
    pub start_time: std::time::Instant,
    pub version: String,
}

impl GatewayState {
    pub fn new(
        store: Arc<IndexStore>,
        pending: Arc<PendingUploadTracker>,
        fetcher: Arc<dyn MediaFetcher>,
        base_url: &Url,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            pending,
            fetcher,
            caption_mount: caption_mount(base_url),
            fetch_timeout: FETCH_TIMEOUT,
            shutdown_tx,
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The gateway server: Telegram polling plus the HTTP endpoints.
pub struct GatewayServer {
    state: GatewayState,
    addr: SocketAddr,
    channel: TelegramChannel,
    context: BotContext,
}

impl GatewayServer {
    /// Load the indexes and wire every component from `config`.
    pub async fn start(config: Config, opts: ServeOpts) -> Result<Self> {
        let mut config = config;
        if let Some(port) = opts.port {
            config.http.port = port;
        }
        validate_config_object(&config)?;

        let addr = resolve_bind_address(&config, opts.bind.as_deref())?;
        let base_url = config.base_url()?;
        let settings = config.resolver_settings()?;

        let files = config.index.files();
        let store = tokio::task::spawn_blocking(move || IndexStore::open(files))
            .await
            .context("index loading task failed")?;
        let store = Arc::new(store);
        let pending = Arc::new(PendingUploadTracker::new());

        let channel = TelegramChannel::new(&config.telegram)?;
        let context = BotContext::new(Arc::clone(&pending), Arc::clone(&store), settings);
        let state = GatewayState::new(store, pending, Arc::new(channel.fetcher()), &base_url);

        info!("Gateway server binding to {}", addr);

        Ok(Self {
            state,
            addr,
            channel,
            context,
        })
    }

    /// Run the server until shutdown signal is received.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let state = self.state.clone();
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        info!("memindex v{} listening on {}", state.version, self.addr);

        let telegram = self.channel.start(self.context.clone());

        print_startup_banner(&state, &self.addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(state.shutdown_tx.clone()))
            .await;

        telegram.stop().await;
        served?;

        info!("Gateway server shut down gracefully");
        Ok(())
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.state.shutdown_tx.send(());
    }
}

/// Build the Axum router with all routes.
fn build_router(state: GatewayState) -> Router {
    routes::build_routes(state)
}

/// Path of `base_url` without the trailing slash (`""` for the root).
pub fn caption_mount(base_url: &Url) -> String {
    base_url.path().trim_end_matches('/').to_string()
}

/// Wait for Ctrl+C, SIGTERM or an explicit [`GatewayServer::shutdown`].
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let mut requested = shutdown_tx.subscribe();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
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
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
        _ = requested.recv() => {
            info!("Shutdown requested");
        }
    }

    let _ = shutdown_tx.send(());
}

/// Resolve the bind address from configuration.
fn resolve_bind_address(config: &Config, bind_override: Option<&str>) -> Result<SocketAddr> {
    let bind = bind_override.unwrap_or(&config.http.bind);
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind:?}"))?;
    Ok(SocketAddr::new(ip, config.http.port))
}

/// Print startup banner with server info.
fn print_startup_banner(state: &GatewayState, addr: &SocketAddr) {
    info!("-------------------------------------------");
    info!("  memindex v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  Health: http://{}/api/health", addr);
    info!("  Captions: http://{}{}/{{ref}}/{{top}}/{{bottom}}", addr, state.caption_mount);
    for stats in state.store.stats() {
        info!("  {}: {} keywords", stats.kind, stats.keywords);
    }
    info!("-------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_strips_trailing_slash() {
        let url = Url::parse("https://memes.example.com/caption/").unwrap();
        assert_eq!(caption_mount(&url), "/caption");
        let root = Url::parse("https://memes.example.com").unwrap();
        assert_eq!(caption_mount(&root), "");
    }

    #[test]
    fn bind_override_wins() {
        let config = Config::default();
        let addr = resolve_bind_address(&config, Some("127.0.0.1")).unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse().unwrap());
        assert!(resolve_bind_address(&config, Some("localhost")).is_err());
    }
}

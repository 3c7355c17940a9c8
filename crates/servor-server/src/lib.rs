//! HTTPS development server with live reload.
//!
//! This crate serves a directory over TLS and pushes reload signals to
//! connected browsers when files under it change:
//! - Static files from the root directory, with a fallback document for
//!   client-side routes
//! - An event stream on a separate port that tells pages to reload
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use servor_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         root_dir: PathBuf::from("public"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTPS──► main port (static_files)
//!    │                   └─► root dir (+ reload snippet on fallback)
//!    │
//!    └──HTTPS──► reload port (event stream) ◄── NotificationHub ◄── notify
//! ```

mod app;
mod error;
mod live_reload;
mod middleware;
mod mime;
mod state;
mod static_files;
mod tls;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

pub use error::ServerError;
use live_reload::LiveReloadManager;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind both listeners to.
    pub host: String,
    /// Port for static files.
    pub port: u16,
    /// Port for the reload event stream.
    pub reload_port: u16,
    /// Directory to serve (and watch).
    pub root_dir: PathBuf,
    /// Document served for route requests, relative to `root_dir`.
    pub fallback: String,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Quiet window before a burst of changes is broadcast (0 disables).
    pub debounce_ms: u64,
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            reload_port: 5000,
            root_dir: PathBuf::from("."),
            fallback: "index.html".to_string(),
            live_reload_enabled: true,
            debounce_ms: 0,
            cert_path: PathBuf::from("servor.crt"),
            key_path: PathBuf::from("servor.key"),
        }
    }
}

/// A server whose listeners are bound but not yet accepting.
pub struct Server {
    acceptor: TlsAcceptor,
    main: (TcpListener, Router),
    reload: Option<(TcpListener, Router)>,
    // Keeps the watcher alive for as long as the server runs
    _live_reload: Option<LiveReloadManager>,
}

impl Server {
    /// Load TLS material, start the watcher and bind both listeners.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS material is missing or invalid, the root
    /// directory cannot be watched (live reload only), or a port cannot be
    /// bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let acceptor = tls::load_acceptor(&config.cert_path, &config.key_path)?;

        // Reload side first: the watcher must be live before pages are served
        let (live_reload, reload) = if config.live_reload_enabled {
            let mut manager = LiveReloadManager::new(config.root_dir.clone(), config.debounce_ms);
            manager.start()?;
            tracing::debug!(
                path = %manager.root_dir().display(),
                port = config.reload_port,
                "Live reload enabled"
            );

            let listener = bind_listener(&config.host, config.reload_port).await?;
            let router = app::create_reload_router(manager.hub());
            (Some(manager), Some((listener, router)))
        } else {
            (None, None)
        };

        let state = Arc::new(AppState::new(
            config.root_dir.clone(),
            config.fallback.clone(),
            config.live_reload_enabled.then_some(config.reload_port),
        ));
        tracing::debug!(
            root = %config.root_dir.display(),
            fallback = %state.fallback,
            live_reload = state.live_reload_enabled(),
            "Static files configured"
        );
        let main = (
            bind_listener(&config.host, config.port).await?,
            app::create_router(state),
        );

        Ok(Self {
            acceptor,
            main,
            reload,
            _live_reload: live_reload,
        })
    }

    /// Address of the static file listener.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.main.0.local_addr()
    }

    /// Address of the reload listener, if live reload is enabled.
    pub fn reload_addr(&self) -> Option<std::io::Result<SocketAddr>> {
        self.reload.as_ref().map(|(listener, _)| listener.local_addr())
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) {
        let Self {
            acceptor,
            main: (main_listener, main_app),
            reload,
            _live_reload: live_reload,
        } = self;

        let main = tls::serve(main_listener, acceptor.clone(), main_app);
        let reload = async move {
            match reload {
                Some((listener, app)) => tls::serve(listener, acceptor, app).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            () = main => {}
            () = reload => {}
            () = shutdown_signal() => {}
        }

        drop(live_reload);
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let server = Server::bind(config).await?;
    server.run().await;
    Ok(())
}

async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr = SocketAddr::from_str(&format!("{host}:{port}"))
        .map_err(|_| ServerError::Address(format!("{host}:{port}")))?;
    tracing::info!(address = %addr, "Starting listener");

    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from servor config.
#[must_use]
pub fn server_config_from_servor_config(config: &servor_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        reload_port: config.live_reload.port,
        root_dir: config.site_resolved.root_dir.clone(),
        fallback: config.site_resolved.fallback.clone(),
        live_reload_enabled: config.live_reload.enabled,
        debounce_ms: config.live_reload.debounce_ms,
        cert_path: config.tls_resolved.cert_path.clone(),
        key_path: config.tls_resolved.key_path.clone(),
    }
}

//! `DevServer`: routing, protocol dispatch and the listener lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Request, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use extdev_core::ExtensionProvider;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::assets;
use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::manifest;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::Broadcaster;
use crate::websocket::channel::{self, ChannelContext};
use crate::websocket::registry::ConnectionRegistry;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Extension list and version.
    pub provider: Arc<dyn ExtensionProvider>,
    /// Live push channels.
    pub registry: Arc<ConnectionRegistry>,
    /// Shutdown flag and push channel task tracking.
    pub shutdown: Arc<ShutdownCoordinator>,
}

/// The extension development server.
pub struct DevServer {
    config: ServerConfig,
    provider: Arc<dyn ExtensionProvider>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl DevServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, provider: Arc<dyn ExtensionProvider>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            config,
            provider,
            broadcaster: Arc::new(Broadcaster::new(Arc::clone(&registry))),
            registry,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            shutdown: Arc::clone(&self.shutdown),
        };

        Router::new()
            .route("/", get(root_redirect))
            .route("/extensions", get(extensions_handler))
            .route("/extensions/", get(extensions_handler))
            .merge(assets::asset_router(&self.provider.extensions()))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Broadcaster for build status updates.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Registry of live push channels.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listener and serve in the background until `cancel` fires.
    ///
    /// Bind failures are returned directly. The returned task resolves once
    /// every push channel has been closed and the port is released.
    pub async fn listen(
        &self,
        cancel: CancellationToken,
    ) -> Result<(SocketAddr, JoinHandle<Result<(), ServerError>>), ServerError> {
        let addr = self.config.bind_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => return Err(ServerError::Bind { addr, source }),
        };
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "extension server listening");

        let lifecycle = Lifecycle {
            router: self.router(),
            registry: Arc::clone(&self.registry),
            shutdown: Arc::clone(&self.shutdown),
            config: self.config.clone(),
        };
        let handle = tokio::spawn(lifecycle.run(listener, cancel));
        Ok((local_addr, handle))
    }

    /// Serve until `cancel` fires, then shut down in order.
    pub async fn start(&self, cancel: CancellationToken) -> Result<(), ServerError> {
        let (_addr, handle) = self.listen(cancel).await?;
        handle.await?
    }
}

/// Everything the background server task owns.
struct Lifecycle {
    router: Router,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    config: ServerConfig,
}

impl Lifecycle {
    async fn run(self, listener: TcpListener, cancel: CancellationToken) -> Result<(), ServerError> {
        let stop = CancellationToken::new();
        let stop_signal = stop.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { stop_signal.cancelled().await });
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            result = &mut server => {
                // the listener stopped on its own
                return result?.map_err(ServerError::from);
            }
            () = cancel.cancelled() => {}
        }

        info!("shutting down extension server");
        self.shutdown.shutdown();
        let closed = self.registry.close_all();
        info!(closed, "closed push channels");

        stop.cancel();
        server.await??;
        let _ = self.shutdown.drain(self.config.shutdown_timeout()).await;
        info!("extension server stopped");
        Ok(())
    }
}

/// `GET /`: permanent redirect to the manifest.
async fn root_redirect() -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/extensions/")],
    )
}

/// `GET /extensions/`: push channel upgrade or JSON manifest.
async fn extensions_handler(State(state): State<AppState>, request: Request) -> Response {
    if !is_upgrade_request(request.headers()) {
        return manifest::respond(state.provider.as_ref()).into_response();
    }

    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => channel::upgrade(
            ws,
            ChannelContext {
                provider: state.provider,
                registry: state.registry,
                shutdown: state.shutdown,
            },
        ),
        Err(rejection) => {
            debug!(%rejection, "push channel upgrade rejected");
            rejection.into_response()
        }
    }
}

/// Whether the request asks to switch to the `WebSocket` protocol.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    let upgrade_websocket = headers
        .get_all(header::UPGRADE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("websocket"));
    connection_upgrade && upgrade_websocket
}

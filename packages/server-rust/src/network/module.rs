//! Network module with deferred startup lifecycle.
//!
//! `new()` wires the shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown signal fires.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    collection_handler, collections_handler, configuration_handler, configurations_handler,
    conformance_handler, feature_handler, health_handler, items_handler, landing_handler,
    liveness_handler, queryables_handler, readiness_handler, AppState,
};
use super::middleware::{admit_request, build_http_layers};
use super::openapi::openapi_handler;
use super::shutdown::ShutdownController;
use crate::features::SpatialFeatureQueryEngine;
use crate::service::MapConfigurationAssembler;
use crate::storage::TableInformation;

/// How long in-flight requests may take to finish after the listener closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Assembles the axum router with all routes and middleware.
///
/// API routes pass through the admission middleware and are refused once
/// draining starts; the health routes always answer.
pub fn build_router(state: AppState) -> Router {
    let layers = build_http_layers(&state.config);

    let api = Router::new()
        .route("/api/v1", get(landing_handler))
        .route("/api/v1/conformance", get(conformance_handler))
        .route("/api/v1/configurations", get(configurations_handler))
        .route(
            "/api/v1/configurations/{mapConfigId}",
            get(configuration_handler),
        )
        .route(
            "/api/v1/configurations/{mapConfigId}/groups/{groupId}/collections/{collectionId}/items",
            get(items_handler),
        )
        .route(
            "/api/v1/configurations/{mapConfigId}/collections/{collectionId}/items/{featureId}",
            get(feature_handler),
        )
        .route("/api/v1/{mapConfigId}/collections", get(collections_handler))
        .route(
            "/api/v1/{mapConfigId}/collections/{collectionId}",
            get(collection_handler),
        )
        .route(
            "/api/v1/{mapConfigId}/collections/{collectionId}/queryables",
            get(queryables_handler),
        )
        .route("/openapi/v1.json", get(openapi_handler))
        .route_layer(from_fn_with_state(state.clone(), admit_request));

    Router::new()
        .merge(api)
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(layers)
        .with_state(state)
}

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (shutdown controller, handler state)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        engine: SpatialFeatureQueryEngine,
        assembler: MapConfigurationAssembler,
        tables: TableInformation,
    ) -> Self {
        let shutdown = Arc::new(ShutdownController::new());
        let state = AppState {
            shutdown: Arc::clone(&shutdown),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
            engine,
            assembler,
            tables,
        };
        Self {
            config,
            listener: None,
            shutdown,
            state,
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured port
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains.
    ///
    /// When the signal fires the health state moves to Draining, new API
    /// requests get 503, and in-flight ones get up to 30 seconds to finish.
    ///
    /// # Errors
    ///
    /// Fails when `start()` was not called first, when TLS material cannot
    /// be loaded, or on a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .context("start() must be called before serve()")?;
        let router = build_router(self.state);
        let shutdown_ctrl = self.shutdown;

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        let signal = async move {
            shutdown.await;
            signal_ctrl.trigger_shutdown();
        };

        shutdown_ctrl.set_ready();

        if let Some(tls_config) = &self.config.tls {
            serve_tls(listener, router, tls_config, signal).await?;
        } else {
            serve_plain(listener, router, signal).await?;
        }

        drain(&shutdown_ctrl).await;
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("serving plain HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await?;
    Ok(())
}

/// Serves TLS connections using `axum-server` with rustls, reusing the
/// pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &TlsConfig,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .context("failed to load TLS certificates")?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        signal.await;
        shutdown_handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
    });

    info!(%addr, "serving HTTPS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

/// Waits for in-flight requests and moves to Stopped.
async fn drain(shutdown_ctrl: &ShutdownController) {
    shutdown_ctrl.trigger_shutdown();
    if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
        info!("all requests drained");
    } else {
        warn!(
            in_flight = shutdown_ctrl.in_flight_count(),
            "drain timeout expired with requests remaining"
        );
    }
}

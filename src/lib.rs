use {
    crate::{
        env::Config,
        error::{RpcError, RpcResult},
        utils::{relay::BundlerRelay, smart_account::Owner},
    },
    axum::{
        http,
        routing::{get, post},
        Router,
    },
    metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle},
    std::{
        future::IntoFuture,
        net::SocketAddr,
        sync::{Arc, OnceLock},
    },
    tokio::{net::TcpListener, sync::broadcast},
    tower::ServiceBuilder,
    tower_http::{
        cors::{Any, CorsLayer},
        request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
        trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    },
    tracing::{info, warn, Level},
};

pub mod env;
pub mod error;
mod handlers;
mod json_rpc;
mod metrics;
mod state;
mod utils;

#[cfg(test)]
mod test_helpers;

pub async fn bootstrap(shutdown: broadcast::Receiver<()>, config: Config) -> RpcResult<()> {
    if let Some(key) = config.account.default_key() {
        Owner::from_key(&key).map_err(|e| {
            RpcError::InvalidConfiguration(format!("WALLET_RPC_ACCOUNT_OWNER_PUBLIC_KEY: {e}"))
        })?;
    }

    let relay = BundlerRelay::new(config.relay.url.clone(), config.relay.timeout());
    let state = state::new_state(config, Arc::new(relay), metrics_recorder());

    let port = state.config.server.port;
    let host = state.config.server.host.clone();
    let private_port = state.config.server.private_port;
    info!(
        chain_id = state.chain_id(),
        entry_point = %state.entry_point.address,
        relay = %state.config.relay.url,
        "v{}",
        env!("CARGO_PKG_VERSION")
    );

    let state_arc = Arc::new(state);

    let cors = CorsLayer::new().allow_origin(Any).allow_headers([
        http::header::CONTENT_TYPE,
        http::header::USER_AGENT,
        http::header::REFERER,
        http::header::ORIGIN,
        http::header::ACCESS_CONTROL_REQUEST_METHOD,
        http::header::ACCESS_CONTROL_REQUEST_HEADERS,
    ]);

    let global_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(true),
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    let app = Router::new()
        .route("/rpc", post(handlers::wallet::handler::handler))
        .route("/v1/wallet", post(handlers::wallet::handler::handler))
        .route("/health", get(handlers::health::handler))
        .layer(cors)
        .layer(global_middleware)
        .with_state(state_arc.clone());

    let private_app = Router::new()
        .route("/metrics", get(handlers::metrics::handler))
        .with_state(state_arc);

    let addr = socket_addr(&host, port)?;
    let private_addr = socket_addr(&host, private_port)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| RpcError::Bind(addr, e))?;
    let private_listener = TcpListener::bind(private_addr)
        .await
        .map_err(|e| RpcError::Bind(private_addr, e))?;

    info!("Running wallet RPC on {addr}, metrics on {private_addr}");

    let public_server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.resubscribe()))
        .into_future();
    let private_server = axum::serve(private_listener, private_app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .into_future();

    let services = vec![tokio::spawn(public_server), tokio::spawn(private_server)];

    match futures_util::future::select_all(services).await.0 {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RpcError::Serve(e)),
        Err(e) => {
            warn!("Server task failed: {e:?}");
            Err(RpcError::Other(e.into()))
        }
    }
}

/// Both listeners bind to the configured host.
fn socket_addr(host: &str, port: u16) -> RpcResult<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| RpcError::InvalidConfiguration(format!("{host}:{port}: {e}")))
}

/// Resolves when the shutdown channel fires or its sender is dropped.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
    info!("Shutting down");
}

/// The recorder is process-global, so every server started in this process
/// shares the first installed handle.
fn metrics_recorder() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Prometheus recorder not installed: {e}");
                None
            }
        })
        .clone()
}

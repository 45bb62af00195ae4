use {
    dotenv::dotenv,
    std::str::FromStr,
    tokio::sync::broadcast,
    tracing_subscriber::fmt::format::FmtSpan,
    wallet_rpc::{
        env::Config,
        error::{self, RpcError},
    },
};

#[tokio::main]
async fn main() -> error::RpcResult<()> {
    dotenv().ok();

    let (_signal, shutdown) = broadcast::channel(1);

    let config = Config::from_env()?;

    let level = tracing::Level::from_str(config.server.log_level.as_str()).map_err(|e| {
        RpcError::InvalidConfiguration(format!("WALLET_RPC_LOG_LEVEL: {e}"))
    })?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .init();

    wallet_rpc::bootstrap(shutdown, config).await
}

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    EnvyError(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),

    #[error("Server error: {0}")]
    Serve(std::io::Error),

    #[error("{0:?}")]
    Other(#[from] anyhow::Error),
}

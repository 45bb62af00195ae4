pub use self::server::WalletRpc;

use {
    async_trait::async_trait,
    test_context::AsyncTestContext,
    wiremock::MockServer,
};

mod server;

pub type TestResult<T> = anyhow::Result<T>;

pub struct ServerContext {
    pub server: WalletRpc,
    /// Stands in for the bundler and node endpoints.
    pub relay: MockServer,
}

#[async_trait]
impl AsyncTestContext for ServerContext {
    async fn setup() -> Self {
        let relay = MockServer::start().await;
        let server = WalletRpc::start(relay.uri().parse().unwrap()).await;
        Self { server, relay }
    }

    async fn teardown(mut self) {
        self.server.shutdown().await;
    }
}

use {
    crate::{
        env::Config,
        handlers::wallet::types::Key,
        utils::{erc4337::EntryPointConfig, relay::RelayGateway},
    },
    metrics_exporter_prometheus::PrometheusHandle,
    std::sync::Arc,
};

pub struct AppState {
    pub config: Config,
    pub relay: Arc<dyn RelayGateway>,
    /// Signer identity for prepare requests that carry no `key`.
    pub default_key: Option<Key>,
    pub entry_point: EntryPointConfig,
    pub metrics: Option<PrometheusHandle>,
    pub uptime: std::time::Instant,
}

pub fn new_state(
    config: Config,
    relay: Arc<dyn RelayGateway>,
    metrics: Option<PrometheusHandle>,
) -> AppState {
    AppState {
        default_key: config.account.default_key(),
        entry_point: config.account.entry_point(),
        config,
        relay,
        metrics,
        uptime: std::time::Instant::now(),
    }
}

impl AppState {
    pub fn chain_id(&self) -> u64 {
        self.config.account.chain_id
    }
}

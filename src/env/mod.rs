use {crate::error, serde::de::DeserializeOwned, serde::Deserialize};

mod account;
mod relay;
mod server;

pub use {account::*, relay::*, server::*};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub account: AccountConfig,
}

impl Config {
    pub fn from_env() -> error::RpcResult<Config> {
        Ok(Self {
            server: from_env("WALLET_RPC_")?,
            relay: from_env("WALLET_RPC_RELAY_")?,
            account: from_env("WALLET_RPC_ACCOUNT_")?,
        })
    }
}

fn from_env<T: DeserializeOwned>(prefix: &str) -> Result<T, envy::Error> {
    envy::prefixed(prefix).from_env()
}

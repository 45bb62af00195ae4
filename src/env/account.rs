use {
    crate::{
        handlers::wallet::types::{Key, KeyType},
        utils::erc4337::{EntryPointConfig, ENTRY_POINT_V06},
    },
    alloy::primitives::{address, Address, Bytes},
    serde::Deserialize,
};

/// Coinbase Smart Wallet factory v1.1.
pub const DEFAULT_FACTORY: Address = address!("ba5ed110efdba3d005bfc882d75358acbbb85842");

/// Base Sepolia.
pub const DEFAULT_CHAIN_ID: u64 = 84532;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Signer identity used when a prepare request carries no `key`.
    #[serde(default)]
    pub owner_public_key: Option<Bytes>,
    #[serde(default = "default_owner_key_type")]
    pub owner_key_type: KeyType,
    #[serde(default = "default_factory")]
    pub factory: Address,
    #[serde(default = "default_entry_point")]
    pub entry_point: Address,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            owner_public_key: None,
            owner_key_type: default_owner_key_type(),
            factory: default_factory(),
            entry_point: default_entry_point(),
        }
    }
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_owner_key_type() -> KeyType {
    KeyType::WebAuthnP256
}

fn default_factory() -> Address {
    DEFAULT_FACTORY
}

fn default_entry_point() -> Address {
    ENTRY_POINT_V06
}

impl AccountConfig {
    pub fn default_key(&self) -> Option<Key> {
        self.owner_public_key.clone().map(|public_key| Key {
            prehash: None,
            public_key,
            key_type: self.owner_key_type,
        })
    }

    pub fn entry_point(&self) -> EntryPointConfig {
        EntryPointConfig::v06(self.entry_point)
    }
}

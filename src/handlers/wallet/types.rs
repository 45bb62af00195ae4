use {
    crate::utils::{erc4337::UserOperationV06, serialize::serialize_hex_json},
    alloy::primitives::{Address, Bytes, B256, U256, U64},
    serde::{Deserialize, Serialize, Serializer},
    serde_json::{Map, Value},
    strum_macros::{AsRefStr, Display, EnumString},
    url::Url,
};

/// Signing algorithm of a [`Key`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum KeyType {
    #[serde(rename = "secp256k1")]
    #[strum(serialize = "secp256k1")]
    Secp256k1,
    #[serde(rename = "p256")]
    #[strum(serialize = "p256")]
    P256,
    #[serde(rename = "webauthn-p256")]
    #[strum(serialize = "webauthn-p256")]
    WebAuthnP256,
    #[serde(rename = "webcrypto-p256")]
    #[strum(serialize = "webcrypto-p256")]
    WebCryptoP256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prehash: Option<bool>,
    pub public_key: Bytes,
    #[serde(rename = "type")]
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub to: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Map<String, Value>>,
}

impl Call {
    pub fn data(&self) -> Bytes {
        self.data.clone().unwrap_or_default()
    }

    pub fn value(&self) -> U256 {
        self.value.unwrap_or_default()
    }
}

/// Capability map of a request. The raw map is echoed back verbatim; the
/// capabilities this service acts on are lifted out during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub raw: Map<String, Value>,
    pub data_suffix: Option<Bytes>,
    pub paymaster_service: Option<PaymasterService>,
}

impl Serialize for Capabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymasterService {
    pub url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum SignatureRequestType {
    #[serde(rename = "user-operation-v06")]
    #[strum(serialize = "user-operation-v06")]
    UserOpV6,
}

/// Round-trip state handed to the caller by `wallet_prepareCalls` and
/// returned unchanged to `wallet_sendPreparedCalls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedContext {
    pub r#type: SignatureRequestType,
    #[serde(serialize_with = "serialize_hex_json")]
    pub data: UserOperationV06,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareCallsRequest {
    pub calls: Vec<Call>,
    pub capabilities: Option<Capabilities>,
    pub chain_id: U64,
    pub from: Option<Address>,
    pub key: Option<Key>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCallsResponse {
    pub capabilities: Capabilities,
    pub chain_id: U64,
    pub context: PreparedContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    pub digest: B256,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPreparedCallsRequest {
    pub capabilities: Capabilities,
    pub chain_id: U64,
    pub context: PreparedContext,
    pub key: Key,
    pub signature: Bytes,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPreparedCallsResponse {
    pub id: B256,
    pub capabilities: Capabilities,
}

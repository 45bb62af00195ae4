#![warn(missing_docs)]

//! The crate exports the JSON-RPC 2.0 envelope types exchanged with wallet
//! clients.

use {
    derive_more::{Display, From},
    serde::{Deserialize, Serialize},
    serde_json::{Number, Value},
    std::sync::Arc,
};


/// The only protocol version this service speaks.
pub const JSON_RPC_VERSION: &str = "2.0";

/// Represents the message ID type. Clients may use numbers or strings, and
/// the number is echoed exactly as sent, sign and fraction included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From, Display)]
#[serde(untagged)]
pub enum MessageId {
    /// Numeric identifier.
    Number(Number),
    /// String identifier.
    String(Arc<str>),
}

impl MessageId {
    /// Recover an id from an arbitrary JSON value. Anything that is not a
    /// number or a string yields `None` and is answered with a `null` id.
    pub fn recover(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Number(number) => Some(MessageId::Number(number.clone())),
            Value::String(string) => Some(MessageId::String(string.as_str().into())),
            _ => None,
        }
    }
}

/// Enum representing a JSON RPC Response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    /// A response with a result.
    Result(JsonRpcResult),
    /// A response depicting an error.
    Error(JsonRpcError),
}

impl JsonRpcResponse {
    /// Successful response for `id`.
    pub fn result(id: Option<MessageId>, result: Value) -> Self {
        JsonRpcResponse::Result(JsonRpcResult {
            id,
            jsonrpc: JSON_RPC_VERSION.into(),
            result,
        })
    }

    /// Error response for `id`.
    pub fn error(id: Option<MessageId>, error: ErrorResponse) -> Self {
        JsonRpcResponse::Error(JsonRpcError {
            id,
            jsonrpc: JSON_RPC_VERSION.into(),
            error,
        })
    }
}

/// Data structure representing a JSON RPC Result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcResult {
    /// ID this message corresponds to, `null` when it could not be recovered.
    pub id: Option<MessageId>,
    /// RPC version.
    pub jsonrpc: Arc<str>,
    /// The result for the message.
    pub result: Value,
}

/// Data structure representing a JSON RPC Error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// ID this message corresponds to, `null` when it could not be recovered.
    pub id: Option<MessageId>,
    /// RPC version.
    pub jsonrpc: Arc<str>,
    /// The ErrorResponse corresponding to this message.
    pub error: ErrorResponse,
}

/// Data structure representing a ErrorResponse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: Arc<str>,
    /// Error data, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

//! Schema checks for raw `wallet_*` parameters.
//!
//! Validation is pure: it reads the decoded JSON value, never mutates it and
//! performs no I/O. Each rejected field is reported with its path so the
//! caller can fix the request without guessing.

use {
    super::types::{
        Call,
        Capabilities,
        Key,
        KeyType,
        PaymasterService,
        PrepareCallsRequest,
        PreparedContext,
        SendPreparedCallsRequest,
        SignatureRequestType,
    },
    crate::utils::{erc4337::UserOperationV06, smart_account::InvalidPublicKey},
    alloy::primitives::{hex, Address, Bytes, U256, U64},
    serde_json::{Map, Value},
    std::{fmt, str::FromStr},
    url::Url,
};

const HEX_PREFIX: &str = "0x";
const ADDRESS_HEX_DIGITS: usize = 40;
const MAX_QUANTITY_HEX_DIGITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid parameters: '{path}' {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: Reason,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: Reason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Missing,
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
    MalformedHex(String),
    MalformedQuantity(String),
    MalformedAddress(String),
    MalformedUrl(String),
    InsecureUrl(String),
    UntrustedPaymaster(String),
    UnknownKeyType(String),
    UnknownContextType(String),
    Empty,
    OutOfRange(String),
    UnsupportedChain {
        expected: u64,
        actual: U64,
    },
    AccountMismatch {
        expected: Address,
    },
    InvalidPublicKey(InvalidPublicKey),
    NoSigner,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Missing => write!(f, "is required"),
            Reason::WrongType { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Reason::MalformedHex(value) => write!(
                f,
                "expected 0x-prefixed hex bytes with an even number of digits, got {value:?}"
            ),
            Reason::MalformedQuantity(value) => write!(
                f,
                "expected 0x-prefixed hex quantity of 1 to {MAX_QUANTITY_HEX_DIGITS} digits, got {value:?}"
            ),
            Reason::MalformedAddress(value) => {
                write!(f, "expected 0x-prefixed 20-byte hex address, got {value:?}")
            }
            Reason::MalformedUrl(value) => write!(f, "expected an absolute url, got {value:?}"),
            Reason::InsecureUrl(value) => write!(f, "expected an https url, got {value:?}"),
            Reason::UntrustedPaymaster(host) => {
                write!(f, "paymaster host {host:?} is not allowed")
            }
            Reason::UnknownKeyType(value) => write!(
                f,
                "expected one of secp256k1, p256, webauthn-p256, webcrypto-p256, got {value:?}"
            ),
            Reason::UnknownContextType(value) => {
                write!(f, "expected \"{}\", got {value:?}", SignatureRequestType::UserOpV6)
            }
            Reason::Empty => write!(f, "must not be empty"),
            Reason::OutOfRange(value) => write!(f, "{value} does not fit in 64 bits"),
            Reason::UnsupportedChain { expected, actual } => {
                write!(f, "chain 0x{actual:x} is not supported, expected 0x{expected:x}")
            }
            Reason::AccountMismatch { expected } => {
                write!(f, "does not match the account {expected} derived from the key")
            }
            Reason::InvalidPublicKey(e) => write!(f, "{e}"),
            Reason::NoSigner => write!(f, "is required, no default signer is configured"),
        }
    }
}

type Result<T> = std::result::Result<T, ValidationError>;

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}.{name}")
    }
}

fn wrong_type(path: &str, expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::new(
        path,
        Reason::WrongType {
            expected,
            actual: json_type(value),
        },
    )
}

/// Object being validated, with the path of the object itself.
struct Fields<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value, path: &str) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                path: path.to_owned(),
                map,
            }),
            other => Err(wrong_type(path, "object", other)),
        }
    }

    fn path(&self, name: &str) -> String {
        join(&self.path, name)
    }

    fn optional(&self, name: &str) -> Option<(&'a Value, String)> {
        self.map.get(name).map(|value| (value, self.path(name)))
    }

    fn required(&self, name: &str) -> Result<(&'a Value, String)> {
        self.optional(name)
            .ok_or_else(|| ValidationError::new(self.path(name), Reason::Missing))
    }

    fn required_with<T>(
        &self,
        name: &str,
        parse: impl Fn(&'a Value, &str) -> Result<T>,
    ) -> Result<T> {
        let (value, path) = self.required(name)?;
        parse(value, &path)
    }

    fn optional_with<T>(
        &self,
        name: &str,
        parse: impl Fn(&'a Value, &str) -> Result<T>,
    ) -> Result<Option<T>> {
        self.optional(name)
            .map(|(value, path)| parse(value, &path))
            .transpose()
    }
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| wrong_type(path, "string", value))
}

fn boolean(value: &Value, path: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| wrong_type(path, "boolean", value))
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| wrong_type(path, "object", value))
}

fn hex_digits(value: &str) -> Option<&str> {
    let digits = value.strip_prefix(HEX_PREFIX)?;
    digits
        .bytes()
        .all(|b| b.is_ascii_hexdigit())
        .then_some(digits)
}

pub fn hex_bytes(value: &Value, path: &str) -> Result<Bytes> {
    let text = string(value, path)?;
    let malformed = || ValidationError::new(path, Reason::MalformedHex(text.to_owned()));
    let digits = hex_digits(text).ok_or_else(malformed)?;
    if digits.len() % 2 != 0 {
        return Err(malformed());
    }
    hex::decode(digits).map(Bytes::from).map_err(|_| malformed())
}

pub fn quantity(value: &Value, path: &str) -> Result<U256> {
    let text = string(value, path)?;
    let malformed = || ValidationError::new(path, Reason::MalformedQuantity(text.to_owned()));
    let digits = hex_digits(text).ok_or_else(malformed)?;
    if digits.is_empty() || digits.len() > MAX_QUANTITY_HEX_DIGITS {
        return Err(malformed());
    }
    U256::from_str_radix(digits, 16).map_err(|_| malformed())
}

fn chain_id(value: &Value, path: &str) -> Result<U64> {
    let id = quantity(value, path)?;
    u64::try_from(id)
        .map(U64::from)
        .map_err(|_| ValidationError::new(path, Reason::OutOfRange(format!("0x{id:x}"))))
}

pub fn address(value: &Value, path: &str) -> Result<Address> {
    let text = string(value, path)?;
    let malformed = || ValidationError::new(path, Reason::MalformedAddress(text.to_owned()));
    let digits = hex_digits(text).ok_or_else(malformed)?;
    if digits.len() != ADDRESS_HEX_DIGITS {
        return Err(malformed());
    }
    Address::from_str(digits).map_err(|_| malformed())
}

fn url(value: &Value, path: &str) -> Result<Url> {
    let text = string(value, path)?;
    Url::parse(text).map_err(|_| ValidationError::new(path, Reason::MalformedUrl(text.to_owned())))
}

/// Outbound service urls supplied by the caller must use TLS.
fn https_url(value: &Value, path: &str) -> Result<Url> {
    let url = url(value, path)?;
    if url.scheme() != "https" || url.host_str().is_none() {
        return Err(ValidationError::new(path, Reason::InsecureUrl(url.to_string())));
    }
    Ok(url)
}

pub fn key(value: &Value, path: &str) -> Result<Key> {
    let fields = Fields::new(value, path)?;
    let key_type = fields.required_with("type", |value, path| {
        let name = string(value, path)?;
        KeyType::from_str(name)
            .map_err(|_| ValidationError::new(path, Reason::UnknownKeyType(name.to_owned())))
    })?;
    Ok(Key {
        prehash: fields.optional_with("prehash", boolean)?,
        public_key: fields.required_with("publicKey", hex_bytes)?,
        key_type,
    })
}

pub fn call(value: &Value, path: &str) -> Result<Call> {
    let fields = Fields::new(value, path)?;
    Ok(Call {
        to: fields.required_with("to", address)?,
        data: fields.optional_with("data", hex_bytes)?,
        value: fields.optional_with("value", quantity)?,
        capabilities: fields.optional_with("capabilities", |value, path| {
            object(value, path).cloned()
        })?,
    })
}

fn calls(value: &Value, path: &str) -> Result<Vec<Call>> {
    let items = value.as_array().ok_or_else(|| wrong_type(path, "array", value))?;
    if items.is_empty() {
        return Err(ValidationError::new(path, Reason::Empty));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| call(item, &format!("{path}[{index}]")))
        .collect()
}

pub fn capabilities(value: &Value, path: &str) -> Result<Capabilities> {
    let fields = Fields::new(value, path)?;
    Ok(Capabilities {
        raw: fields.map.clone(),
        data_suffix: fields.optional_with("dataSuffix", hex_bytes)?,
        paymaster_service: fields.optional_with("paymasterService", |value, path| {
            let service = Fields::new(value, path)?;
            Ok(PaymasterService {
                url: service.required_with("url", https_url)?,
            })
        })?,
    })
}

fn user_operation(value: &Value, path: &str) -> Result<UserOperationV06> {
    let fields = Fields::new(value, path)?;
    Ok(UserOperationV06 {
        sender: fields.required_with("sender", address)?,
        nonce: fields.required_with("nonce", quantity)?,
        init_code: fields.required_with("initCode", hex_bytes)?,
        call_data: fields.required_with("callData", hex_bytes)?,
        call_gas_limit: fields.required_with("callGasLimit", quantity)?,
        verification_gas_limit: fields.required_with("verificationGasLimit", quantity)?,
        pre_verification_gas: fields.required_with("preVerificationGas", quantity)?,
        max_fee_per_gas: fields.required_with("maxFeePerGas", quantity)?,
        max_priority_fee_per_gas: fields.required_with("maxPriorityFeePerGas", quantity)?,
        paymaster_and_data: fields.required_with("paymasterAndData", hex_bytes)?,
        signature: fields.required_with("signature", hex_bytes)?,
    })
}

fn context(value: &Value, path: &str) -> Result<PreparedContext> {
    let fields = Fields::new(value, path)?;
    let r#type = fields.required_with("type", |value, path| {
        let name = string(value, path)?;
        SignatureRequestType::from_str(name)
            .map_err(|_| ValidationError::new(path, Reason::UnknownContextType(name.to_owned())))
    })?;
    Ok(PreparedContext {
        r#type,
        data: fields.required_with("data", user_operation)?,
    })
}

/// The parameter object: the first element of a non-empty `params` array.
fn first_param(params: &Value) -> Result<&Value> {
    let items = params
        .as_array()
        .ok_or_else(|| wrong_type("params", "array", params))?;
    let first = items
        .first()
        .ok_or_else(|| ValidationError::new("params", Reason::Empty))?;
    object(first, "params[0]")?;
    Ok(first)
}

pub fn prepare_calls_request(params: &Value) -> Result<PrepareCallsRequest> {
    let fields = Fields::new(first_param(params)?, "")?;
    Ok(PrepareCallsRequest {
        calls: fields.required_with("calls", calls)?,
        capabilities: fields.optional_with("capabilities", capabilities)?,
        chain_id: fields.required_with("chainId", chain_id)?,
        from: fields.optional_with("from", address)?,
        key: fields.optional_with("key", key)?,
        version: fields.required_with("version", |v, p| string(v, p).map(str::to_owned))?,
    })
}

pub fn send_prepared_calls_request(params: &Value) -> Result<SendPreparedCallsRequest> {
    let fields = Fields::new(first_param(params)?, "")?;
    Ok(SendPreparedCallsRequest {
        capabilities: fields.required_with("capabilities", capabilities)?,
        chain_id: fields.required_with("chainId", chain_id)?,
        context: fields.required_with("context", context)?,
        key: fields.required_with("key", key)?,
        signature: fields.required_with("signature", hex_bytes)?,
        version: fields.required_with("version", |v, p| string(v, p).map(str::to_owned))?,
    })
}

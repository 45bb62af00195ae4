use {
    super::{
        prepare_calls::{self, PrepareCallsError},
        send_prepared_calls::{self, SendPreparedCallsError},
        validation::ValidationError,
    },
    crate::{
        json_rpc::{ErrorResponse, JsonRpcResponse, MessageId, JSON_RPC_VERSION},
        metrics::Metrics,
        state::AppState,
        utils::relay::RelayError,
    },
    axum::{
        body::Bytes,
        extract::State,
        response::{IntoResponse, Response},
        Json,
    },
    hyper::StatusCode,
    serde_json::{json, Value},
    std::{str::FromStr, sync::Arc, time::Instant},
    strum_macros::{AsRefStr, EnumString},
    thiserror::Error,
    tracing::{debug, error},
};

/// Methods served on the wallet endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
enum WalletMethod {
    #[strum(serialize = "wallet_prepareCalls")]
    PrepareCalls,
    #[strum(serialize = "wallet_sendPreparedCalls")]
    SendPreparedCalls,
}

/// Label used for requests that never reached a known method.
const UNROUTED: &str = "unrouted";

pub async fn handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let (status, response) = dispatch(&state, &body).await;
    (status, Json(response)).into_response()
}

/// Runs one request through parsing, routing and handling, always producing
/// exactly one envelope.
pub async fn dispatch(state: &AppState, body: &[u8]) -> (StatusCode, JsonRpcResponse) {
    let started = Instant::now();
    let (id, method, outcome) = match parse(body) {
        Ok((id, method, params)) => {
            let outcome = handle_rpc(state, method, params).await;
            (id, Some(method), outcome)
        }
        Err((id, e)) => (id, None, Err(e)),
    };

    let label = match &method {
        Some(method) => method.as_ref(),
        None => UNROUTED,
    };
    match outcome {
        Ok(result) => {
            Metrics::add_request(label, 0);
            Metrics::add_latency(label, started.elapsed());
            (StatusCode::OK, JsonRpcResponse::result(id, result))
        }
        Err(e) => {
            if matches!(e, Error::Internal(_)) {
                error!("Internal error handling wallet RPC request: {e:?}");
            } else {
                debug!("Rejected wallet RPC request: {e:?}");
            }
            let code = e.code();
            Metrics::add_request(label, code);
            if method.is_some() {
                Metrics::add_latency(label, started.elapsed());
            }
            (
                e.status(),
                JsonRpcResponse::error(
                    id,
                    ErrorResponse {
                        code,
                        message: e.to_string().into(),
                        data: Some(e.data()),
                    },
                ),
            )
        }
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("Parse error")]
    Parse(serde_json::Error),

    #[error("Invalid Request")]
    InvalidRequest(&'static str),

    #[error("Method not found")]
    MethodNotFound(String),

    #[error("Invalid params")]
    InvalidParams(ValidationError),

    #[error("Internal error")]
    Internal(InternalError),
}

#[derive(Debug, Error)]
enum InternalError {
    #[error(transparent)]
    Relay(RelayError),

    #[error("Serializing response: {0}")]
    SerializeResponse(serde_json::Error),
}

impl Error {
    fn code(&self) -> i32 {
        match self {
            Error::Parse(_) => -32700,
            Error::InvalidRequest(_) => -32600,
            Error::MethodNotFound(_) => -32601,
            Error::InvalidParams(_) => -32602,
            Error::Internal(_) => -32603,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Parse(_) | Error::InvalidRequest(_) | Error::InvalidParams(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::MethodNotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn data(&self) -> Value {
        match self {
            Error::Parse(e) => json!(e.to_string()),
            Error::InvalidRequest(reason) => json!(reason),
            Error::MethodNotFound(method) => json!(format!("Unknown method '{method}'")),
            Error::InvalidParams(e) => json!(e.to_string()),
            Error::Internal(e) => json!(e.to_string()),
        }
    }
}

impl From<PrepareCallsError> for Error {
    fn from(e: PrepareCallsError) -> Self {
        match e {
            PrepareCallsError::Validation(e) => Error::InvalidParams(e),
            PrepareCallsError::Relay(e) => Error::Internal(InternalError::Relay(e)),
        }
    }
}

impl From<SendPreparedCallsError> for Error {
    fn from(e: SendPreparedCallsError) -> Self {
        match e {
            SendPreparedCallsError::Validation(e) => Error::InvalidParams(e),
            SendPreparedCallsError::Relay(e) => Error::Internal(InternalError::Relay(e)),
        }
    }
}

type Envelope = (Option<MessageId>, WalletMethod, Value);

fn parse(body: &[u8]) -> Result<Envelope, (Option<MessageId>, Error)> {
    let value = serde_json::from_slice::<Value>(body).map_err(|e| (None, Error::Parse(e)))?;
    let Value::Object(mut request) = value else {
        let reason = if value.is_array() {
            "batch requests are not supported"
        } else {
            "request must be an object"
        };
        return Err((None, Error::InvalidRequest(reason)));
    };

    let id = MessageId::recover(request.get("id"));
    if request.get("jsonrpc").and_then(Value::as_str) != Some(JSON_RPC_VERSION) {
        return Err((id, Error::InvalidRequest("'jsonrpc' must be \"2.0\"")));
    }
    let method = match request.get("method").and_then(Value::as_str) {
        Some(method) if !method.is_empty() => method,
        _ => return Err((id, Error::InvalidRequest("'method' must be a non-empty string"))),
    };
    let method = WalletMethod::from_str(method)
        .map_err(|_| (id.clone(), Error::MethodNotFound(method.to_owned())))?;

    let params = request.remove("params").unwrap_or(Value::Null);
    Ok((id, method, params))
}

#[tracing::instrument(skip(state, params), level = "debug")]
async fn handle_rpc(state: &AppState, method: WalletMethod, params: Value) -> Result<Value, Error> {
    let result = match method {
        WalletMethod::PrepareCalls => {
            serde_json::to_value(prepare_calls::handler(state, params).await?)
        }
        WalletMethod::SendPreparedCalls => {
            serde_json::to_value(send_prepared_calls::handler(state, params).await?)
        }
    };
    result.map_err(|e| Error::Internal(InternalError::SerializeResponse(e)))
}

use {
    super::{
        types::{SendPreparedCallsRequest, SendPreparedCallsResponse},
        validation::{self, Reason, ValidationError},
    },
    crate::{
        state::AppState,
        utils::{erc4337::user_operation_hash, relay::RelayError},
    },
    serde_json::Value,
    thiserror::Error,
    tracing::debug,
};

#[derive(Error, Debug)]
pub enum SendPreparedCallsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

pub async fn handler(
    state: &AppState,
    params: Value,
) -> Result<SendPreparedCallsResponse, SendPreparedCallsError> {
    let request = validation::send_prepared_calls_request(&params)?;
    handler_internal(state, request).await
}

/// Attaches the signature and forwards the operation. The signature is not
/// checked here; the relay and the entry point are the authority on it.
#[tracing::instrument(skip(state, request), fields(sender = %request.context.data.sender), level = "debug")]
async fn handler_internal(
    state: &AppState,
    request: SendPreparedCallsRequest,
) -> Result<SendPreparedCallsResponse, SendPreparedCallsError> {
    let chain_id = state.chain_id();
    if request.chain_id.to::<u64>() != chain_id {
        return Err(ValidationError::new(
            "chainId",
            Reason::UnsupportedChain {
                expected: chain_id,
                actual: request.chain_id,
            },
        )
        .into());
    }

    let mut user_op = request.context.data;
    user_op.signature = request.signature;
    let digest = user_operation_hash(chain_id, &state.entry_point, &user_op, user_op.sender);
    debug!(
        %digest,
        signature_len = user_op.signature.len(),
        "Submitting user operation"
    );

    let id = state.relay.submit(user_op, state.entry_point).await?;

    Ok(SendPreparedCallsResponse {
        id,
        capabilities: request.capabilities,
    })
}

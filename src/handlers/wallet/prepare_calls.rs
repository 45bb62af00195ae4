use {
    super::{
        builder::OperationBuilder,
        types::{PrepareCallsRequest, PrepareCallsResponse, PreparedContext, SignatureRequestType},
        validation::{self, Reason, ValidationError},
    },
    crate::{
        state::AppState,
        utils::{
            erc4337::user_operation_hash,
            relay::RelayError,
            smart_account::{Owner, SmartAccount},
        },
    },
    serde_json::Value,
    thiserror::Error,
    tracing::debug,
};

#[derive(Error, Debug)]
pub enum PrepareCallsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

pub async fn handler(
    state: &AppState,
    params: Value,
) -> Result<PrepareCallsResponse, PrepareCallsError> {
    let request = validation::prepare_calls_request(&params)?;
    handler_internal(state, request).await
}

#[tracing::instrument(skip(state), level = "debug")]
async fn handler_internal(
    state: &AppState,
    request: PrepareCallsRequest,
) -> Result<PrepareCallsResponse, PrepareCallsError> {
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

    let (key, key_path) = match (&request.key, &state.default_key) {
        (Some(key), _) => (key.clone(), "key.publicKey"),
        (None, Some(key)) => (key.clone(), "key"),
        (None, None) => return Err(ValidationError::new("key", Reason::NoSigner).into()),
    };
    let owner = Owner::from_key(&key)
        .map_err(|e| ValidationError::new(key_path, Reason::InvalidPublicKey(e)))?;
    let account = SmartAccount::new(owner, state.config.account.factory);

    let sender = state
        .relay
        .account_address(account.factory, account.owners())
        .await?;
    if let Some(from) = request.from {
        if from != sender {
            return Err(ValidationError::new(
                "from",
                Reason::AccountMismatch { expected: sender },
            )
            .into());
        }
    }

    let capabilities = request.capabilities.unwrap_or_default();
    let paymaster_service = match &capabilities.paymaster_service {
        Some(service) if !state.config.relay.allows_paymaster(&service.url) => {
            return Err(ValidationError::new(
                "capabilities.paymasterService.url",
                Reason::UntrustedPaymaster(service.url.host_str().unwrap_or_default().to_owned()),
            )
            .into());
        }
        Some(service) => Some(service.url.clone()),
        None => state.config.relay.paymaster_url.clone(),
    };

    let user_op = OperationBuilder::new(state.relay.as_ref(), state.entry_point, chain_id)
        .build(
            &account,
            sender,
            &request.calls,
            capabilities.data_suffix.as_ref(),
            paymaster_service,
        )
        .await?;

    let digest = user_operation_hash(chain_id, &state.entry_point, &user_op, sender);
    debug!(%digest, "Prepared user operation");

    Ok(PrepareCallsResponse {
        capabilities,
        chain_id: request.chain_id,
        context: PreparedContext {
            r#type: SignatureRequestType::UserOpV6,
            data: user_op,
        },
        key: Some(key),
        digest,
        version: request.version,
    })
}

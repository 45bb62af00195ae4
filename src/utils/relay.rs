//! Outbound client to the bundler and paymaster services.
//!
//! Every call is bounded by the configured timeout and is never retried: the
//! relay is authoritative and a failure is reported to the caller as-is.

use {
    crate::{
        metrics::Metrics,
        utils::{
            erc4337::{EntryPointConfig, UserOperationV06},
            erc7677::{PaymasterRpcClient, PmGetPaymasterDataParams},
            serialize::to_hex_json,
            smart_account::{ICoinbaseSmartWalletFactory, IEntryPoint},
        },
    },
    alloy::{
        primitives::{aliases::U192, Address, Bytes, B256, U256, U64},
        rpc::client::{ClientBuilder, RpcClient},
        sol_types::SolCall,
        transports::{RpcError, TransportErrorKind},
    },
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::{json, Map, Value},
    std::{future::IntoFuture, time::Duration},
    tracing::{debug, warn},
    url::Url,
};

pub const ETH_CALL: &str = "eth_call";
pub const ETH_GET_CODE: &str = "eth_getCode";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const ETH_MAX_PRIORITY_FEE_PER_GAS: &str = "eth_maxPriorityFeePerGas";
pub const ETH_ESTIMATE_USER_OPERATION_GAS: &str = "eth_estimateUserOperationGas";
pub const ETH_SEND_USER_OPERATION: &str = "eth_sendUserOperation";

/// `maxFeePerGas = baseFee * 12 / 10 + maxPriorityFeePerGas`.
const BASE_FEE_MULTIPLIER_NUMERATOR: u64 = 12;
const BASE_FEE_MULTIPLIER_DENOMINATOR: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("{method} rejected by relay ({code}): {message}")]
    Rejected {
        method: &'static str,
        code: i64,
        message: String,
    },

    #[error("{method} transport failure: {message}")]
    Transport {
        method: &'static str,
        message: String,
    },

    #[error("{method} timed out after {}s", .timeout.as_secs())]
    Timeout {
        method: &'static str,
        timeout: Duration,
    },

    #[error("{method} returned a malformed response: {message}")]
    MalformedResponse {
        method: &'static str,
        message: String,
    },
}

impl RelayError {
    fn from_rpc(method: &'static str, error: RpcError<TransportErrorKind>) -> Self {
        match error {
            RpcError::ErrorResp(payload) => RelayError::Rejected {
                method,
                code: payload.code,
                message: payload.message.to_string(),
            },
            RpcError::DeserError { err, text } => RelayError::MalformedResponse {
                method,
                message: format!("{err}: {text}"),
            },
            RpcError::NullResp => RelayError::MalformedResponse {
                method,
                message: "null response".to_owned(),
            },
            other => RelayError::Transport {
                method,
                message: other.to_string(),
            },
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            RelayError::Rejected { .. } => "rejected",
            RelayError::Transport { .. } => "transport",
            RelayError::Timeout { .. } => "timeout",
            RelayError::MalformedResponse { .. } => "malformed",
        }
    }
}

/// What the relay needs to fill in gas, fee and nonce fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub sender: Address,
    /// Deployment code, used only while the account has no code on chain.
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub stub_signature: Bytes,
    pub paymaster_service: Option<Url>,
    pub entry_point: EntryPointConfig,
    pub chain_id: u64,
}

/// The fields of a user operation owned by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialUserOperation {
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    /// Set when a paymaster must still sign the final operation.
    pub paymaster_pending: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayGateway: Send + Sync {
    /// Counterfactual account address for `owners` under `factory`.
    async fn account_address(
        &self,
        factory: Address,
        owners: Vec<Bytes>,
    ) -> Result<Address, RelayError>;

    async fn estimate(&self, request: EstimateRequest)
        -> Result<PartialUserOperation, RelayError>;

    /// Final `paymasterAndData` for a fully built operation.
    async fn sponsor(
        &self,
        paymaster_service: Url,
        user_op: UserOperationV06,
        entry_point: EntryPointConfig,
        chain_id: u64,
    ) -> Result<Bytes, RelayError>;

    /// Submits a signed operation, returning the relay's user operation hash.
    async fn submit(
        &self,
        user_op: UserOperationV06,
        entry_point: EntryPointConfig,
    ) -> Result<B256, RelayError>;
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthEstimateUserOperationGasV06Response {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockFees {
    base_fee_per_gas: Option<U256>,
}

pub struct BundlerRelay {
    client: RpcClient,
    timeout: Duration,
}

impl BundlerRelay {
    pub fn new(url: Url, timeout: Duration) -> Self {
        let client = ClientBuilder::default().http(url);
        Self { client, timeout }
    }

    async fn call<F, T>(&self, method: &'static str, request: F) -> Result<T, RelayError>
    where
        F: IntoFuture<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(|e| RelayError::from_rpc(method, e)),
            Err(_) => Err(RelayError::Timeout {
                method,
                timeout: self.timeout,
            }),
        };
        match &result {
            Ok(_) => Metrics::add_relay_call(method, "ok"),
            Err(e) => {
                warn!("Relay call failed: {e}");
                Metrics::add_relay_call(method, e.outcome());
            }
        }
        result
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, RelayError> {
        let params = (json!({ "to": to, "data": Bytes::from(data) }), "latest");
        self.call(ETH_CALL, self.client.request(ETH_CALL, params))
            .await
    }

    async fn is_deployed(&self, address: Address) -> Result<bool, RelayError> {
        let code: Bytes = self
            .call(
                ETH_GET_CODE,
                self.client.request(ETH_GET_CODE, (address, "latest")),
            )
            .await?;
        Ok(!code.is_empty())
    }

    async fn nonce(&self, entry_point: Address, sender: Address) -> Result<U256, RelayError> {
        let data = IEntryPoint::getNonceCall {
            sender,
            key: U192::ZERO,
        }
        .abi_encode();
        let output = self.eth_call(entry_point, data).await?;
        IEntryPoint::getNonceCall::abi_decode_returns(&output, true)
            .map(|r| r.nonce)
            .map_err(|e| RelayError::MalformedResponse {
                method: ETH_CALL,
                message: e.to_string(),
            })
    }

    /// Returns `(maxFeePerGas, maxPriorityFeePerGas)`.
    async fn fees(&self) -> Result<(U256, U256), RelayError> {
        let priority_fee: U256 = self
            .call(
                ETH_MAX_PRIORITY_FEE_PER_GAS,
                self.client
                    .request(ETH_MAX_PRIORITY_FEE_PER_GAS, Vec::<Value>::new()),
            )
            .await?;
        let block: BlockFees = self
            .call(
                ETH_GET_BLOCK_BY_NUMBER,
                self.client
                    .request(ETH_GET_BLOCK_BY_NUMBER, ("latest", false)),
            )
            .await?;
        let base_fee = block
            .base_fee_per_gas
            .ok_or(RelayError::MalformedResponse {
                method: ETH_GET_BLOCK_BY_NUMBER,
                message: "latest block has no baseFeePerGas".to_owned(),
            })?;
        let max_fee = base_fee * U256::from(BASE_FEE_MULTIPLIER_NUMERATOR)
            / U256::from(BASE_FEE_MULTIPLIER_DENOMINATOR)
            + priority_fee;
        Ok((max_fee, priority_fee))
    }

    fn paymaster_params(
        user_op: &UserOperationV06,
        entry_point: &EntryPointConfig,
        chain_id: u64,
    ) -> PmGetPaymasterDataParams {
        PmGetPaymasterDataParams {
            user_op: user_op.clone(),
            entrypoint: entry_point.address,
            chain_id: U64::from(chain_id),
            context: Map::new(),
        }
    }
}

#[async_trait]
impl RelayGateway for BundlerRelay {
    #[tracing::instrument(skip(self, owners), level = "debug")]
    async fn account_address(
        &self,
        factory: Address,
        owners: Vec<Bytes>,
    ) -> Result<Address, RelayError> {
        let data = ICoinbaseSmartWalletFactory::getAddressCall {
            owners,
            nonce: U256::ZERO,
        }
        .abi_encode();
        let output = self.eth_call(factory, data).await?;
        ICoinbaseSmartWalletFactory::getAddressCall::abi_decode_returns(&output, true)
            .map(|r| r._0)
            .map_err(|e| RelayError::MalformedResponse {
                method: ETH_CALL,
                message: e.to_string(),
            })
    }

    #[tracing::instrument(skip(self, request), fields(sender = %request.sender), level = "debug")]
    async fn estimate(
        &self,
        request: EstimateRequest,
    ) -> Result<PartialUserOperation, RelayError> {
        let init_code = if self.is_deployed(request.sender).await? {
            Bytes::new()
        } else {
            request.init_code
        };
        let nonce = self
            .nonce(request.entry_point.address, request.sender)
            .await?;
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.fees().await?;

        let mut user_op = UserOperationV06 {
            sender: request.sender,
            nonce,
            init_code,
            call_data: request.call_data,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            signature: request.stub_signature,
            ..Default::default()
        };

        let mut paymaster_pending = false;
        if let Some(url) = request.paymaster_service {
            let paymaster = PaymasterRpcClient::new(url);
            let stub = self
                .call(
                    crate::utils::erc7677::PM_GET_PAYMASTER_STUB_DATA,
                    paymaster.pm_get_paymaster_stub_data(Self::paymaster_params(
                        &user_op,
                        &request.entry_point,
                        request.chain_id,
                    )),
                )
                .await?;
            user_op.paymaster_and_data = stub.paymaster_and_data;
            paymaster_pending = !stub.is_final;
        }

        let gas: EthEstimateUserOperationGasV06Response = self
            .call(
                ETH_ESTIMATE_USER_OPERATION_GAS,
                self.client.request(
                    ETH_ESTIMATE_USER_OPERATION_GAS,
                    (to_hex_json(&user_op), request.entry_point.address),
                ),
            )
            .await?;
        debug!(?gas, "Estimated user operation gas");

        Ok(PartialUserOperation {
            nonce: user_op.nonce,
            init_code: user_op.init_code,
            call_gas_limit: gas.call_gas_limit,
            verification_gas_limit: gas.verification_gas_limit,
            pre_verification_gas: gas.pre_verification_gas,
            max_fee_per_gas: user_op.max_fee_per_gas,
            max_priority_fee_per_gas: user_op.max_priority_fee_per_gas,
            paymaster_and_data: user_op.paymaster_and_data,
            paymaster_pending,
        })
    }

    #[tracing::instrument(skip(self, user_op), level = "debug")]
    async fn sponsor(
        &self,
        paymaster_service: Url,
        user_op: UserOperationV06,
        entry_point: EntryPointConfig,
        chain_id: u64,
    ) -> Result<Bytes, RelayError> {
        let paymaster = PaymasterRpcClient::new(paymaster_service);
        let response = self
            .call(
                crate::utils::erc7677::PM_GET_PAYMASTER_DATA,
                paymaster.pm_get_paymaster_data(Self::paymaster_params(
                    &user_op,
                    &entry_point,
                    chain_id,
                )),
            )
            .await?;
        Ok(response.paymaster_and_data)
    }

    #[tracing::instrument(skip(self, user_op), fields(sender = %user_op.sender), level = "debug")]
    async fn submit(
        &self,
        user_op: UserOperationV06,
        entry_point: EntryPointConfig,
    ) -> Result<B256, RelayError> {
        self.call(
            ETH_SEND_USER_OPERATION,
            self.client.request(
                ETH_SEND_USER_OPERATION,
                (to_hex_json(&user_op), entry_point.address),
            ),
        )
        .await
    }
}

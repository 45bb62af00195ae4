use {
    super::types::Call,
    crate::utils::{
        erc4337::{EntryPointConfig, UserOperationV06},
        relay::{EstimateRequest, PartialUserOperation, RelayError, RelayGateway},
        smart_account::SmartAccount,
    },
    alloy::primitives::{Address, Bytes},
    tracing::debug,
    url::Url,
};

/// Assembles unsigned user operations. Gas, fee and nonce values always come
/// from the relay.
pub struct OperationBuilder<'a> {
    relay: &'a dyn RelayGateway,
    entry_point: EntryPointConfig,
    chain_id: u64,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(relay: &'a dyn RelayGateway, entry_point: EntryPointConfig, chain_id: u64) -> Self {
        Self {
            relay,
            entry_point,
            chain_id,
        }
    }

    #[tracing::instrument(skip_all, fields(sender = %sender, calls = calls.len()), level = "debug")]
    pub async fn build(
        &self,
        account: &SmartAccount,
        sender: Address,
        calls: &[Call],
        data_suffix: Option<&Bytes>,
        paymaster_service: Option<Url>,
    ) -> Result<UserOperationV06, RelayError> {
        let call_data = SmartAccount::encode_calls(calls);
        let signature = account.stub_signature();

        let estimated = self
            .relay
            .estimate(EstimateRequest {
                sender,
                init_code: account.init_code(),
                call_data: call_data.clone(),
                stub_signature: signature.clone(),
                paymaster_service: paymaster_service.clone(),
                entry_point: self.entry_point,
                chain_id: self.chain_id,
            })
            .await?;
        let paymaster_pending = estimated.paymaster_pending;

        let mut user_op = assemble(sender, call_data, signature, estimated);
        user_op.call_data = append_data_suffix(&user_op.call_data, data_suffix);

        if let (true, Some(url)) = (paymaster_pending, paymaster_service) {
            user_op.paymaster_and_data = self
                .relay
                .sponsor(url, user_op.clone(), self.entry_point, self.chain_id)
                .await?;
        }

        debug!(nonce = %user_op.nonce, "Built user operation");
        Ok(user_op)
    }
}

fn assemble(
    sender: Address,
    call_data: Bytes,
    signature: Bytes,
    estimated: PartialUserOperation,
) -> UserOperationV06 {
    UserOperationV06 {
        sender,
        nonce: estimated.nonce,
        init_code: estimated.init_code,
        call_data,
        call_gas_limit: estimated.call_gas_limit,
        verification_gas_limit: estimated.verification_gas_limit,
        pre_verification_gas: estimated.pre_verification_gas,
        max_fee_per_gas: estimated.max_fee_per_gas,
        max_priority_fee_per_gas: estimated.max_priority_fee_per_gas,
        paymaster_and_data: estimated.paymaster_and_data,
        signature,
    }
}

/// `call_data ++ suffix`, applied after gas estimation.
pub fn append_data_suffix(call_data: &Bytes, suffix: Option<&Bytes>) -> Bytes {
    match suffix {
        Some(suffix) => [call_data.as_ref(), suffix.as_ref()].concat().into(),
        None => call_data.clone(),
    }
}

use {
    crate::utils::serialize::{Node, ToNode},
    alloy::{
        primitives::{address, keccak256, Address, Bytes, B256, U256},
        sol_types::SolValue,
    },
    serde::{Deserialize, Serialize},
    strum_macros::Display,
};

/// Canonical v0.6 entry point deployment.
pub const ENTRY_POINT_V06: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum EntryPointVersion {
    #[serde(rename = "0.6")]
    #[strum(serialize = "0.6")]
    V06,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPointConfig {
    pub address: Address,
    pub version: EntryPointVersion,
}

impl EntryPointConfig {
    pub const fn v06(address: Address) -> Self {
        Self {
            address,
            version: EntryPointVersion::V06,
        }
    }
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self::v06(ENTRY_POINT_V06)
    }
}

/// User operation as consumed by the v0.6 entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV06 {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperationV06 {
    /// ABI encoding of the hashed fields, with dynamic fields replaced by
    /// their keccak256. `sender` is taken from the argument so callers can
    /// hash against the account address they resolved themselves.
    fn pack_for_hash(&self, sender: Address) -> Vec<u8> {
        (
            sender,
            self.nonce,
            keccak256(&self.init_code),
            keccak256(&self.call_data),
            self.call_gas_limit,
            self.verification_gas_limit,
            self.pre_verification_gas,
            self.max_fee_per_gas,
            self.max_priority_fee_per_gas,
            keccak256(&self.paymaster_and_data),
        )
            .abi_encode_params()
    }
}

impl ToNode for UserOperationV06 {
    fn to_node(&self) -> Node {
        Node::mapping([
            ("sender", self.sender.to_node()),
            ("nonce", self.nonce.to_node()),
            ("initCode", self.init_code.to_node()),
            ("callData", self.call_data.to_node()),
            ("callGasLimit", self.call_gas_limit.to_node()),
            ("verificationGasLimit", self.verification_gas_limit.to_node()),
            ("preVerificationGas", self.pre_verification_gas.to_node()),
            ("maxFeePerGas", self.max_fee_per_gas.to_node()),
            ("maxPriorityFeePerGas", self.max_priority_fee_per_gas.to_node()),
            ("paymasterAndData", self.paymaster_and_data.to_node()),
            ("signature", self.signature.to_node()),
        ])
    }
}

/// The digest the account owner signs, identical to what the entry point's
/// `getUserOpHash` returns on chain. The signature field is not hashed.
pub fn user_operation_hash(
    chain_id: u64,
    entry_point: &EntryPointConfig,
    user_op: &UserOperationV06,
    sender: Address,
) -> B256 {
    match entry_point.version {
        EntryPointVersion::V06 => keccak256(
            (
                keccak256(user_op.pack_for_hash(sender)),
                entry_point.address,
                U256::from(chain_id),
            )
                .abi_encode_params(),
        ),
    }
}

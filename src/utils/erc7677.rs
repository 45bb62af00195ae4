//! ERC-7677 paymaster web service client for the v0.6 entry point.

use {
    crate::utils::{erc4337::UserOperationV06, serialize::to_hex_json},
    alloy::{
        primitives::{Address, Bytes, U64},
        rpc::client::{ClientBuilder, RpcClient},
        transports::TransportResult,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    url::Url,
};

pub const PM_GET_PAYMASTER_STUB_DATA: &str = "pm_getPaymasterStubData";
pub const PM_GET_PAYMASTER_DATA: &str = "pm_getPaymasterData";

pub struct PaymasterRpcClient {
    pub client: RpcClient,
}

impl PaymasterRpcClient {
    pub fn new(url: Url) -> Self {
        let client = ClientBuilder::default().http(url);
        Self { client }
    }

    pub async fn pm_get_paymaster_stub_data(
        &self,
        params: PmGetPaymasterDataParams,
    ) -> TransportResult<PmGetPaymasterStubDataResponse> {
        self.client
            .request(PM_GET_PAYMASTER_STUB_DATA, params.into_tuple())
            .await
    }

    pub async fn pm_get_paymaster_data(
        &self,
        params: PmGetPaymasterDataParams,
    ) -> TransportResult<PmGetPaymasterDataResponse> {
        self.client
            .request(PM_GET_PAYMASTER_DATA, params.into_tuple())
            .await
    }
}

pub struct PmGetPaymasterDataParams {
    pub user_op: UserOperationV06,
    pub entrypoint: Address,
    pub chain_id: U64,
    pub context: Map<String, Value>,
}

impl PmGetPaymasterDataParams {
    pub fn into_tuple(self) -> (Value, Address, U64, Map<String, Value>) {
        (
            to_hex_json(&self.user_op),
            self.entrypoint,
            self.chain_id,
            self.context,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmGetPaymasterStubDataResponse {
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmGetPaymasterDataResponse {
    pub paymaster_and_data: Bytes,
}

use {
    crate::{
        context::{ServerContext, WalletRpc},
        utils::{mock_relay, mock_relay_delayed, send_jsonrpc_request},
    },
    alloy::primitives::{address, Address, B256},
    reqwest::StatusCode,
    serde_json::{json, Value},
    std::time::Duration,
    test_context::test_context,
    wiremock::MockServer,
};

const ACCOUNT: Address = address!("00000000000000000000000000000000000acc01");

async fn mock_estimation(ctx: &ServerContext) {
    mock_relay(&ctx.relay, "eth_call", Ok(json!(ACCOUNT.into_word()))).await;
    mock_relay(&ctx.relay, "eth_getCode", Ok(json!("0x"))).await;
    mock_relay(&ctx.relay, "eth_maxPriorityFeePerGas", Ok(json!("0x64"))).await;
    mock_relay(
        &ctx.relay,
        "eth_getBlockByNumber",
        Ok(json!({ "number": "0x10", "baseFeePerGas": "0x3e8" })),
    )
    .await;
    mock_relay(
        &ctx.relay,
        "eth_estimateUserOperationGas",
        Ok(json!({
            "preVerificationGas": "0xb5f0",
            "verificationGasLimit": "0x5b8d8",
            "callGasLimit": "0x2710",
        })),
    )
    .await;
}

fn prepare_calls_request(id: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "wallet_prepareCalls",
        "params": [{
            "calls": [
                { "to": "0x036CbD53842c5426634e7929541eC2318f3dCF7e", "data": "0xa9059cbb" },
                { "to": "0x0000000000000000000000000000000000000001", "value": "0x1" },
            ],
            "capabilities": { "dataSuffix": "0xdddddddd" },
            "chainId": "0x14a34",
            "key": {
                "type": "secp256k1",
                "publicKey": "0x1306b01bc3e4ad202612d3843387e94737673f53",
            },
            "version": "1.0",
        }],
    })
    .to_string()
}

#[test_context(ServerContext)]
#[tokio::test]
async fn parse_error(ctx: &mut ServerContext) {
    let (status, body) = send_jsonrpc_request(ctx.server.public_url("/rpc"), "{").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["jsonrpc"], json!("2.0"));
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["error"]["code"], json!(-32700));
}

#[test_context(ServerContext)]
#[tokio::test]
async fn unknown_method(ctx: &mut ServerContext) {
    let (status, body) = send_jsonrpc_request(
        ctx.server.public_url("/v1/wallet"),
        r#"{"jsonrpc":"2.0","id":"abc","method":"foo_bar","params":[]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["id"], json!("abc"));
    assert_eq!(body["error"]["code"], json!(-32601));
    assert_eq!(body["error"]["message"], json!("Method not found"));
}

#[test_context(ServerContext)]
#[tokio::test]
async fn batch_is_invalid_request(ctx: &mut ServerContext) {
    let (status, body) = send_jsonrpc_request(
        ctx.server.public_url("/rpc"),
        r#"[{"jsonrpc":"2.0","id":1,"method":"wallet_prepareCalls","params":[]}]"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["error"]["code"], json!(-32600));
}

#[test_context(ServerContext)]
#[tokio::test]
async fn prepare_calls(ctx: &mut ServerContext) {
    mock_estimation(ctx).await;

    let (status, body) =
        send_jsonrpc_request(ctx.server.public_url("/rpc"), prepare_calls_request(json!(7))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], json!(7));

    let result = &body["result"];
    assert_eq!(result["chainId"], json!("0x14a34"));
    assert_eq!(result["version"], json!("1.0"));
    assert_eq!(result["key"]["type"], json!("secp256k1"));
    assert_eq!(result["capabilities"], json!({ "dataSuffix": "0xdddddddd" }));
    serde_json::from_value::<B256>(result["digest"].clone()).unwrap();

    let context = &result["context"];
    assert_eq!(context["type"], json!("user-operation-v06"));
    let user_op = &context["data"];
    assert_eq!(user_op["sender"], json!(ACCOUNT.to_checksum(None)));
    assert_eq!(user_op["callGasLimit"], json!("0x2710"));
    assert_eq!(user_op["maxFeePerGas"], json!("0x514"));
    assert_eq!(user_op["maxPriorityFeePerGas"], json!("0x64"));
    assert_eq!(user_op["paymasterAndData"], json!("0x"));
    assert!(user_op["callData"].as_str().unwrap().ends_with("dddddddd"));
    assert!(user_op["initCode"].as_str().unwrap().len() > 42);
}

#[test_context(ServerContext)]
#[tokio::test]
async fn prepare_then_send(ctx: &mut ServerContext) {
    mock_estimation(ctx).await;
    let hash = B256::repeat_byte(0x42);
    mock_relay(&ctx.relay, "eth_sendUserOperation", Ok(json!(hash))).await;

    let (_, prepared) =
        send_jsonrpc_request(ctx.server.public_url("/rpc"), prepare_calls_request(json!(1))).await;
    let prepared = &prepared["result"];

    let request = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "wallet_sendPreparedCalls",
        "params": [{
            "capabilities": prepared["capabilities"],
            "chainId": prepared["chainId"],
            "context": prepared["context"],
            "key": prepared["key"],
            "signature": format!("0x{}", "ab".repeat(65)),
            "version": "1.0",
        }],
    });
    let (status, body) =
        send_jsonrpc_request(ctx.server.public_url("/rpc"), request.to_string()).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], json!(2));
    assert_eq!(body["result"]["id"], json!(hash));
    assert_eq!(body["result"]["capabilities"], prepared["capabilities"]);
}

#[test_context(ServerContext)]
#[tokio::test]
async fn send_rejected_by_relay(ctx: &mut ServerContext) {
    mock_relay(
        &ctx.relay,
        "eth_sendUserOperation",
        Err(json!({ "code": -32507, "message": "Invalid UserOperation signature or paymaster signature" })),
    )
    .await;

    let (status, body) = send_jsonrpc_request(
        ctx.server.public_url("/rpc"),
        send_prepared_calls_request(json!(3)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["id"], json!(3));
    assert_eq!(body["error"]["code"], json!(-32603));
    assert!(body["error"]["data"]
        .as_str()
        .unwrap()
        .contains("Invalid UserOperation signature or paymaster signature"));
}

#[test_context(ServerContext)]
#[tokio::test]
async fn invalid_params_name_the_field(ctx: &mut ServerContext) {
    let (status, body) = send_jsonrpc_request(
        ctx.server.public_url("/rpc"),
        r#"{"jsonrpc":"2.0","id":4,"method":"wallet_prepareCalls","params":[{"calls":[],"chainId":"0x14a34","version":"1.0"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!(-32602));
    assert!(body["error"]["data"].as_str().unwrap().contains("'calls'"));
}

fn send_prepared_calls_request(id: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "wallet_sendPreparedCalls",
        "params": [{
            "capabilities": {},
            "chainId": "0x14a34",
            "context": {
                "type": "user-operation-v06",
                "data": {
                    "sender": ACCOUNT,
                    "nonce": "0x0",
                    "initCode": "0x",
                    "callData": "0x",
                    "callGasLimit": "0x0",
                    "verificationGasLimit": "0x0",
                    "preVerificationGas": "0x0",
                    "maxFeePerGas": "0x0",
                    "maxPriorityFeePerGas": "0x0",
                    "paymasterAndData": "0x",
                    "signature": "0x",
                },
            },
            "key": { "type": "p256", "publicKey": "0x01" },
            "signature": "0x1234",
            "version": "1.0",
        }],
    })
    .to_string()
}

#[tokio::test]
async fn slow_relay_still_answers_with_envelope() {
    let relay = MockServer::start().await;
    mock_relay_delayed(
        &relay,
        "eth_sendUserOperation",
        Ok(json!(B256::ZERO)),
        Duration::from_secs(3),
    )
    .await;
    let mut server = WalletRpc::start_with_relay_timeout(relay.uri().parse().unwrap(), 1).await;

    let (status, body) = send_jsonrpc_request(
        server.public_url("/rpc"),
        send_prepared_calls_request(json!("slow-1")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["jsonrpc"], json!("2.0"));
    assert_eq!(body["id"], json!("slow-1"));
    assert_eq!(body["error"]["code"], json!(-32603));
    assert!(
        body["error"]["data"].as_str().unwrap().contains("timed out"),
        "{body}"
    );

    server.shutdown().await;
}

#[test_context(ServerContext)]
#[tokio::test]
async fn non_integer_ids_are_echoed(ctx: &mut ServerContext) {
    for id in [json!(-5), json!(1.5)] {
        let (status, body) = send_jsonrpc_request(
            ctx.server.public_url("/rpc"),
            json!({ "jsonrpc": "2.0", "id": id, "method": "foo_bar" }).to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["id"], id);
    }
}

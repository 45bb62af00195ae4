use {
    crate::{
        env::{AccountConfig, Config, RelayConfig, ServerConfig},
        handlers::wallet::types::{Key, KeyType},
        state::{new_state, AppState},
        utils::relay::MockRelayGateway,
    },
    serde_json::{json, Value},
    std::{sync::Arc, time::Duration},
    wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, Request, Respond, ResponseTemplate,
    },
};

/// JSON-RPC reply for a mocked upstream, echoing the request id.
pub struct RpcReply {
    reply: Result<Value, Value>,
    delay: Duration,
}

impl RpcReply {
    pub fn result(result: Value) -> Self {
        Self {
            reply: Ok(result),
            delay: Duration::ZERO,
        }
    }

    pub fn error(code: i64, message: &str) -> Self {
        Self {
            reply: Err(json!({ "code": code, "message": message })),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

impl Respond for RpcReply {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get("id").cloned())
            .unwrap_or(Value::Null);
        let body = match &self.reply {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
        };
        ResponseTemplate::new(200)
            .set_body_json(body)
            .set_delay(self.delay)
    }
}

pub async fn mock_rpc(server: &MockServer, rpc_method: &str, reply: RpcReply) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(reply)
        .mount(server)
        .await;
}

/// Application state over a mocked relay, configured for Base Sepolia.
pub fn test_state(relay: MockRelayGateway, default_key: Option<Key>) -> AppState {
    let config = Config {
        server: ServerConfig::default(),
        relay: RelayConfig {
            url: "http://127.0.0.1:1".parse().unwrap(),
            timeout_secs: 1,
            paymaster_url: None,
            paymaster_hosts: Vec::new(),
        },
        account: AccountConfig {
            owner_public_key: default_key.as_ref().map(|key| key.public_key.clone()),
            owner_key_type: default_key
                .map(|key| key.key_type)
                .unwrap_or(KeyType::WebAuthnP256),
            ..Default::default()
        },
    };
    new_state(config, Arc::new(relay), None)
}

use {
    reqwest::StatusCode,
    serde_json::{json, Value},
    std::time::Duration,
    wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, Request, Respond, ResponseTemplate,
    },
};

pub async fn send_jsonrpc_request(url: String, body: impl Into<reqwest::Body>) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    let status = response.status();
    (status, response.json().await.unwrap())
}

/// Upstream JSON-RPC reply echoing the request id.
pub struct RelayReply {
    reply: Result<Value, Value>,
    delay: Duration,
}

impl Respond for RelayReply {
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

pub async fn mock_relay(server: &MockServer, rpc_method: &str, reply: Result<Value, Value>) {
    mock_relay_delayed(server, rpc_method, reply, Duration::ZERO).await;
}

pub async fn mock_relay_delayed(
    server: &MockServer,
    rpc_method: &str,
    reply: Result<Value, Value>,
    delay: Duration,
) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(RelayReply { reply, delay })
        .mount(server)
        .await;
}

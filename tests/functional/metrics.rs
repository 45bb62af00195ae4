use {
    crate::{context::ServerContext, utils::send_jsonrpc_request},
    reqwest::StatusCode,
    test_context::test_context,
};

#[test_context(ServerContext)]
#[tokio::test]
async fn metrics_check(ctx: &mut ServerContext) {
    let (status, _) = send_jsonrpc_request(
        ctx.server.public_url("/rpc"),
        r#"{"jsonrpc":"2.0","id":1,"method":"foo_bar"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = reqwest::get(ctx.server.private_url("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(body.contains("wallet_rpc_requests"), "{body}");
}

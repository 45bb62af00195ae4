use {crate::context::ServerContext, reqwest::StatusCode, test_context::test_context};

#[test_context(ServerContext)]
#[tokio::test]
async fn health_check(ctx: &mut ServerContext) {
    let response = reqwest::get(ctx.server.public_url("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.starts_with(&format!("OK v{}", env!("CARGO_PKG_VERSION"))), "{body}");
    assert!(body.ends_with("seconds"), "{body}");
}

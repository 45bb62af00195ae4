use {
    crate::state::AppState,
    axum::{extract::State, response::IntoResponse},
    hyper::StatusCode,
    std::sync::Arc,
};

pub async fn handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "OK v{}, uptime: {} seconds",
            env!("CARGO_PKG_VERSION"),
            state.uptime.elapsed().as_secs()
        ),
    )
}

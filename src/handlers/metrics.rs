use {
    crate::state::AppState,
    axum::{extract::State, response::IntoResponse},
    hyper::StatusCode,
    std::sync::Arc,
};

pub async fn handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        None => (
            StatusCode::OK,
            format!("No metrics installed v{}", env!("CARGO_PKG_VERSION")),
        ),
        Some(handle) => (StatusCode::OK, handle.render()),
    }
}

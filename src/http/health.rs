//! Instance health endpoint.

use axum::extract::State;

use crate::http::server::AppState;

/// Plain-text instance id. Needs neither identity nor readiness.
pub async fn health(State(state): State<AppState>) -> String {
    state.manager.health_check_id().to_string()
}

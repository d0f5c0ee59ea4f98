use axum::extract::State;
use axum::http::StatusCode;

use cf_core::health::readiness;

use crate::state::AppState;

/// `GET /readyz`: ready once the collection store answers.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(state.store.ping().await)
}

use axum::{Router, http::HeaderName, routing::get};
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;

use cf_core::health::healthz;
use cf_core::middleware::{REQUEST_ID_HEADER, request_id_layer};

use crate::handlers::health::readyz;
use crate::handlers::records::{list_records, view_record};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Records
        .route("/api/collections/{collection}/records", get(list_records))
        .route(
            "/api/collections/{collection}/records/{id}",
            get(view_record),
        )
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}

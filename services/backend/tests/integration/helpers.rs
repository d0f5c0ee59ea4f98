use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use cf_backend::router::build_router;
use cf_backend::state::AppState;
use cf_backend_provisioner::Provisioner;
use cf_collections::{Record, RecordRepository};
use cf_testing::auth::MockAuth;
use cf_testing::fixture::object;
use cf_testing::store::TestStore;

/// A fresh store with both backend collections provisioned.
pub async fn provisioned_store() -> TestStore {
    let test = TestStore::new().await;
    let report = Provisioner::run(&test.store).await;
    assert!(report.is_complete(), "provisioning failed: {report:?}");
    test
}

pub fn router(test: &TestStore) -> Router {
    build_router(AppState {
        store: test.store.clone(),
    })
}

pub fn user_data(email: &str) -> Value {
    json!({
        "email": email,
        "name": "Ada Lovelace",
        "tenant_id": "tenant-1",
        "product_id": "product-1",
        "role": "user",
        "status": "active",
    })
}

pub fn usage_data(cost: f64) -> Value {
    json!({
        "tenant_id": "tenant-1",
        "user_id": "user-1",
        "model": "gpt-4o-mini",
        "input_tokens": 120,
        "output_tokens": 30,
        "total_tokens": 150,
        "cost": cost,
        "metadata": {"route": "/v1/chat/completions"},
    })
}

pub async fn create_user(test: &TestStore, email: &str) -> Record {
    test.store
        .create_record("cf_users", object(user_data(email)))
        .await
        .unwrap()
}

/// Send a GET, optionally as `auth`, and return status plus JSON body.
pub async fn get(router: Router, uri: &str, auth: Option<&MockAuth>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(auth) = auth {
        for (name, value) in &auth.headers() {
            request = request.header(name, value);
        }
    }
    let resp = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

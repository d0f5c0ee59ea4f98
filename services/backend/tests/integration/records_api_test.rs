use axum::http::StatusCode;

use cf_testing::auth::MockAuth;

use crate::helpers::{create_user, get, provisioned_store, router};

// ── GET /api/collections/{collection}/records ────────────────────────────────

#[tokio::test]
async fn should_deny_anonymous_list() {
    let test = provisioned_store().await;
    create_user(&test, "ada@example.com").await;

    let (status, body) = get(router(&test), "/api/collections/cf_users/records", None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_list_records_for_authenticated_caller() {
    let test = provisioned_store().await;
    create_user(&test, "ada@example.com").await;
    create_user(&test, "grace@example.com").await;
    let auth = MockAuth::new("user-1");

    let (status, body) = get(
        router(&test),
        "/api/collections/cf_users/records?per-page=1&sort=email",
        Some(&auth),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 1);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["items"][0]["email"], "ada@example.com");
    assert_eq!(body["items"][0]["collectionName"], "cf_users");
}

#[tokio::test]
async fn should_reject_sort_on_unknown_field() {
    let test = provisioned_store().await;
    let auth = MockAuth::new("user-1");

    let (status, body) = get(
        router(&test),
        "/api/collections/usage_logs/records?sort=-price",
        Some(&auth),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_SORT");
}

#[tokio::test]
async fn should_reject_malformed_page() {
    let test = provisioned_store().await;
    let auth = MockAuth::new("user-1");

    let (status, body) = get(
        router(&test),
        "/api/collections/usage_logs/records?page=first",
        Some(&auth),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_QUERY");
}

#[tokio::test]
async fn should_return_404_for_unknown_collection() {
    let test = provisioned_store().await;
    let auth = MockAuth::new("user-1");

    let (status, body) = get(router(&test), "/api/collections/tenants/records", Some(&auth)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "COLLECTION_NOT_FOUND");
}

// ── GET /api/collections/{collection}/records/{id} ───────────────────────────

#[tokio::test]
async fn should_deny_anonymous_view() {
    let test = provisioned_store().await;
    let user = create_user(&test, "ada@example.com").await;

    let uri = format!("/api/collections/cf_users/records/{}", user.id);
    let (status, _) = get(router(&test), &uri, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_view_record_for_authenticated_caller() {
    let test = provisioned_store().await;
    let user = create_user(&test, "ada@example.com").await;
    let auth = MockAuth::new("user-1").claim("tenant_id", "tenant-1");

    let uri = format!("/api/collections/cf_users/records/{}", user.id);
    let (status, body) = get(router(&test), &uri, Some(&auth)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.as_str());
    assert_eq!(body["role"], "user");
    assert_eq!(body["budget_limit"], serde_json::Value::Null);
}

#[tokio::test]
async fn should_return_404_for_unknown_record() {
    let test = provisioned_store().await;
    let auth = MockAuth::new("user-1");

    let (status, body) = get(
        router(&test),
        "/api/collections/cf_users/records/missing",
        Some(&auth),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "RECORD_NOT_FOUND");
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_health_checks() {
    let test = provisioned_store().await;
    let (status, _) = get(router(&test), "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(router(&test), "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
}

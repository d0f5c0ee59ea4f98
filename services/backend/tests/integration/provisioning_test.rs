use cf_backend_provisioner::Provisioner;
use cf_backend_schema::cf_users;
use cf_collections::{CollectionRepository, FieldError, RecordRepository, StoreError};
use cf_testing::fixture::object;
use cf_testing::store::TestStore;

use crate::helpers::{create_user, provisioned_store, usage_data, user_data};

// ── Provisioning ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_exactly_the_backend_collections() {
    let test = provisioned_store().await;

    let names: Vec<String> = test
        .store
        .list_collections()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["cf_users", "usage_logs"]);

    let users = test.store.find_collection("cf_users").await.unwrap().unwrap();
    assert_eq!(users, cf_users::collection());
    let field_names: Vec<&str> = users.fields.names().collect();
    assert_eq!(
        field_names,
        [
            "email",
            "name",
            "tenant_id",
            "product_id",
            "role",
            "status",
            "budget_limit",
            "budget_used",
            "api_key",
            "last_login",
            "created",
            "updated",
        ]
    );
}

#[tokio::test]
async fn should_persist_collections_across_reopen() {
    let test = provisioned_store().await;
    let reopened = test.reopen().await;

    let logs = reopened.find_collection("usage_logs").await.unwrap().unwrap();
    assert_eq!(logs.indexes.len(), 3);
    assert!(logs.field("metadata").is_some());
}

#[tokio::test]
async fn should_log_failure_for_existing_collection_and_continue() {
    let test = TestStore::new().await;
    test.store.save(&cf_users::collection()).await.unwrap();

    let report = Provisioner::run(&test.store).await;

    let failed: Vec<&str> = report.failed().map(|(name, _)| name).collect();
    assert_eq!(failed, ["cf_users"]);
    assert!(matches!(
        report.failed().next(),
        Some((_, StoreError::CollectionExists(_)))
    ));
    assert_eq!(report.created().collect::<Vec<_>>(), ["usage_logs"]);
    assert!(test.store.find_collection("usage_logs").await.unwrap().is_some());
}

#[tokio::test]
async fn should_fail_every_collection_on_second_run() {
    let test = provisioned_store().await;
    let report = Provisioner::run(&test.store).await;
    assert_eq!(report.failed().count(), 2);
    assert_eq!(test.store.list_collections().await.unwrap().len(), 2);
}

// ── Record constraints ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_second_user_with_same_email() {
    let test = provisioned_store().await;
    create_user(&test, "ada@example.com").await;

    let result = test
        .store
        .create_record("cf_users", object(user_data("ada@example.com")))
        .await;

    match result {
        Err(StoreError::Validation(errors)) => {
            assert_eq!(errors.get("email"), Some(&FieldError::NotUnique));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn should_reject_role_outside_enumeration() {
    let test = provisioned_store().await;
    let mut data = object(user_data("grace@example.com"));
    data.insert("role".into(), "owner".into());

    let result = test.store.create_record("cf_users", data).await;

    match result {
        Err(StoreError::Validation(errors)) => {
            assert_eq!(
                errors.get("role"),
                Some(&FieldError::InvalidValue("owner".into()))
            );
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn should_reject_negative_cost() {
    let test = provisioned_store().await;

    let result = test
        .store
        .create_record("usage_logs", object(usage_data(-0.01)))
        .await;

    match result {
        Err(StoreError::Validation(errors)) => {
            assert_eq!(errors.get("cost"), Some(&FieldError::BelowMin(0.0)));
            assert_eq!(errors.len(), 1);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn should_store_usage_log_with_zero_cost_and_metadata() {
    let test = provisioned_store().await;

    let record = test
        .store
        .create_record("usage_logs", object(usage_data(0.0)))
        .await
        .unwrap();

    assert_eq!(record.get("cost"), Some(&serde_json::json!(0)));
    assert_eq!(
        record.get("metadata"),
        Some(&serde_json::json!({"route": "/v1/chat/completions"}))
    );
    assert!(record.get_str("created").is_some());
    assert_eq!(record.get_str("created"), record.get_str("updated"));
}

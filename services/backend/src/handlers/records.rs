use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use cf_auth_types::identity::RequestAuth;
use cf_collections::{
    AccessRule, Collection, CollectionRepository, Record, RecordPage, RecordRepository,
};
use cf_domain::auth::AuthContext;
use cf_domain::pagination::PageRequest;

use crate::error::BackendError;
use crate::state::AppState;

// ── Query params ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RecordListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
}

impl RecordListQuery {
    fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest {
            per_page: self.per_page.unwrap_or(default.per_page),
            page: self.page.unwrap_or(default.page),
        }
        .clamped()
    }
}

// ── GET /api/collections/{collection}/records ────────────────────────────────

pub async fn list_records(
    RequestAuth(auth): RequestAuth,
    State(state): State<AppState>,
    Path(collection): Path<String>,
    query: Result<Query<RecordListQuery>, QueryRejection>,
) -> Result<Json<RecordPage>, BackendError> {
    let Query(query) = query.map_err(|_| BackendError::InvalidQuery)?;

    let collection = load_collection(&state, &collection).await?;
    let rule = collection.list_access()?;
    authorize(&rule, &auth)?;

    let page = state
        .store
        .list_records(&collection.name, query.page_request(), query.sort.as_deref())
        .await?;
    Ok(Json(page))
}

// ── GET /api/collections/{collection}/records/{id} ───────────────────────────

pub async fn view_record(
    RequestAuth(auth): RequestAuth,
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Record>, BackendError> {
    let collection = load_collection(&state, &collection).await?;
    let rule = collection.view_access()?;
    authorize(&rule, &auth)?;

    let record = state
        .store
        .find_record(&collection.name, &id)
        .await?
        .ok_or(BackendError::RecordNotFound)?;
    Ok(Json(record))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn load_collection(state: &AppState, name: &str) -> Result<Collection, BackendError> {
    state
        .store
        .find_collection(name)
        .await?
        .ok_or(BackendError::CollectionNotFound)
}

fn authorize(rule: &AccessRule, auth: &AuthContext) -> Result<(), BackendError> {
    if rule.allows(auth) {
        Ok(())
    } else {
        tracing::debug!(user_id = ?auth.id, "access rule denied request");
        Err(BackendError::Forbidden)
    }
}

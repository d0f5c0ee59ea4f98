//! Schema provisioning for the backend's collections.
//!
//! [`Provisioner::run`] submits every collection definition to the store in
//! a fixed order. A failed save is logged and the next collection is still
//! attempted; nothing is retried or rolled back.

use tracing::{error, info};

use cf_backend_schema::{cf_users, usage_logs};
use cf_collections::{Collection, CollectionRepository, StoreError};

pub struct Provisioner;

/// Outcome of one provisioning pass, in submission order.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub outcomes: Vec<(String, Result<(), StoreError>)>,
}

impl ProvisionReport {
    pub fn created(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(name, _)| name.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &StoreError)> {
        self.outcomes
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }
}

impl Provisioner {
    /// Collection definitions, `cf_users` first.
    pub fn collections() -> Vec<Collection> {
        vec![cf_users::collection(), usage_logs::collection()]
    }

    /// Save every collection once. Never fails; per-collection errors land in the report.
    pub async fn run<R: CollectionRepository>(repo: &R) -> ProvisionReport {
        Self::run_with(repo, Self::collections()).await
    }

    pub async fn run_with<R: CollectionRepository>(
        repo: &R,
        collections: Vec<Collection>,
    ) -> ProvisionReport {
        info!(count = collections.len(), "creating collections");
        let mut report = ProvisionReport::default();
        for collection in collections {
            let result = repo.save(&collection).await;
            match &result {
                Ok(()) => info!(collection = %collection.name, "collection created"),
                Err(e) => error!(
                    collection = %collection.name,
                    error = %e,
                    "failed to create collection"
                ),
            }
            report.outcomes.push((collection.name, result));
        }
        info!(
            created = report.created().count(),
            failed = report.failed().count(),
            "collections setup complete"
        );
        report
    }
}

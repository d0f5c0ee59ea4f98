//! Throwaway collection stores.

use tempfile::TempDir;

use cf_collections::DbCollectionStore;
use cf_collections::config::StoreConfig;

/// A bootstrapped sqlite store living in a temp dir removed on drop.
pub struct TestStore {
    pub store: DbCollectionStore,
    pub config: StoreConfig,
    _dir: TempDir,
}

impl TestStore {
    /// Panics if the temp dir or database cannot be created.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp data dir");
        let config = StoreConfig::for_data_dir(dir.path());
        let store = DbCollectionStore::connect(&config)
            .await
            .expect("open test store");
        store.bootstrap().await.expect("bootstrap test store");
        Self {
            store,
            config,
            _dir: dir,
        }
    }

    /// A second handle onto the same database, as a restarted process would open.
    pub async fn reopen(&self) -> DbCollectionStore {
        DbCollectionStore::connect(&self.config)
            .await
            .expect("reopen test store")
    }
}

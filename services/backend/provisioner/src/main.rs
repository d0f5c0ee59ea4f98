use tracing::info;

use cf_backend_provisioner::Provisioner;
use cf_collections::DbCollectionStore;
use cf_collections::config::StoreConfig;

/// Run one provisioning pass against the configured store and exit.
#[tokio::main]
async fn main() {
    cf_core::config::load_dotenv();
    cf_core::tracing::init_tracing();

    let config = StoreConfig::from_env();
    let store = DbCollectionStore::connect(&config)
        .await
        .expect("failed to open collection store");
    store
        .bootstrap()
        .await
        .expect("failed to bootstrap collection store");

    let report = Provisioner::run(&store).await;
    info!(complete = report.is_complete(), "provisioning finished");
}

use cf_backend::app::App;
use cf_backend::config::BackendConfig;
use cf_backend::hooks::provision_collections;
use cf_backend::state::AppState;
use cf_collections::DbCollectionStore;

#[tokio::main]
async fn main() {
    cf_core::config::load_dotenv();
    cf_core::tracing::init_tracing();

    let config = BackendConfig::from_env();

    let store = DbCollectionStore::connect(&config.store)
        .await
        .expect("failed to open collection store");
    store
        .bootstrap()
        .await
        .expect("failed to bootstrap collection store");

    let mut app = App::new(AppState { store });
    app.on_serve(provision_collections);

    let listener = tokio::net::TcpListener::bind(config.http_addr())
        .await
        .expect("failed to bind");

    app.start(listener).await.expect("server error");
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use cf_backend::app::App;
use cf_backend::hooks::provision_collections;
use cf_backend::state::AppState;
use cf_collections::CollectionRepository;
use cf_testing::store::TestStore;

async fn listener() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

/// Issue a raw HTTP/1.1 GET and return the status line.
async fn status_line(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response.lines().next().unwrap_or_default().to_owned()
}

#[tokio::test]
async fn should_run_each_hook_once_before_serving() {
    let test = TestStore::new().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let ready_tx = Arc::new(std::sync::Mutex::new(Some(ready_tx)));

    let mut app = App::new(AppState {
        store: test.store.clone(),
    });
    let counter = Arc::clone(&calls);
    app.on_serve(move |event| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = ready_tx.lock().unwrap().take() {
            let _ = tx.send(event.addr);
        }
        async { Ok(()) }.boxed()
    });

    let server = tokio::spawn(app.start(listener().await));
    let addr = tokio::time::timeout(Duration::from_secs(5), ready_rx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status_line(addr, "/healthz").await, "HTTP/1.1 200 OK");
    assert_eq!(status_line(addr, "/readyz").await, "HTTP/1.1 200 OK");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    server.abort();
}

#[tokio::test]
async fn should_provision_collections_on_serve() {
    let test = TestStore::new().await;
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel::<()>();
    let ready_tx = Arc::new(std::sync::Mutex::new(Some(ready_tx)));

    let mut app = App::new(AppState {
        store: test.store.clone(),
    });
    app.on_serve(provision_collections).on_serve(move |_| {
        if let Some(tx) = ready_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
        async { Ok(()) }.boxed()
    });

    let server = tokio::spawn(app.start(listener().await));
    tokio::time::timeout(Duration::from_secs(5), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let names: Vec<String> = test
        .store
        .list_collections()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["cf_users", "usage_logs"]);
    server.abort();
}

#[tokio::test]
async fn should_abort_start_when_a_hook_fails() {
    let test = TestStore::new().await;
    let mut app = App::new(AppState {
        store: test.store.clone(),
    });
    app.on_serve(|_| async { Err(anyhow::anyhow!("boom")) }.boxed());

    let result = tokio::time::timeout(Duration::from_secs(5), app.start(listener().await))
        .await
        .unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "serve hook failed");
}

//! Server lifecycle: serve hooks and the HTTP listener.

use std::net::SocketAddr;

use anyhow::Context;
use futures::future::BoxFuture;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Passed to every serve hook once the listener is bound.
#[derive(Clone)]
pub struct ServeEvent {
    pub state: AppState,
    pub addr: SocketAddr,
}

type ServeHook = Box<dyn Fn(ServeEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub struct App {
    state: AppState,
    hooks: Vec<ServeHook>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            hooks: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Register a hook run once, in registration order, after the listener
    /// is bound and before the first request is accepted.
    pub fn on_serve<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(ServeEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Run the serve hooks, then serve until the server stops.
    ///
    /// A failing hook aborts startup.
    pub async fn start(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener
            .local_addr()
            .context("failed to read listener address")?;

        for hook in &self.hooks {
            let event = ServeEvent {
                state: self.state.clone(),
                addr,
            };
            hook(event).await.context("serve hook failed")?;
        }

        info!("backend listening on {addr}");
        axum::serve(listener, build_router(self.state))
            .await
            .context("server error")
    }
}

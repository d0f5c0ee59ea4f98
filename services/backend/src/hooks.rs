use futures::FutureExt;
use futures::future::BoxFuture;

use cf_backend_provisioner::Provisioner;

use crate::app::ServeEvent;

/// Serve hook that provisions the backend's collections.
///
/// Per-collection failures are logged by the provisioner and never abort startup.
pub fn provision_collections(event: ServeEvent) -> BoxFuture<'static, anyhow::Result<()>> {
    async move {
        Provisioner::run(&event.state.store).await;
        Ok(())
    }
    .boxed()
}

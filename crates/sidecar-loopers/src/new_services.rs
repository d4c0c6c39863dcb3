use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sidecar_adapters::LocalServiceSource;
use sidecar_catalog::CatalogState;

use crate::looper;

/// Feeds discovery + health results into the catalog on a periodic cadence
/// (spec §5's "new-services tracker"): each tick, pulls the current local
/// services from `source` and merges each via `UpdateService`. The merge's
/// own `Invalidates` rule decides whether anything actually changes.
pub async fn run(
    source: Arc<LocalServiceSource>,
    catalog: Arc<CatalogState>,
    period: Duration,
    shutdown: impl Future<Output = ()> + Unpin,
) {
    looper::fixed_interval(period, None, shutdown, move || {
        let source = source.clone();
        let catalog = catalog.clone();
        async move {
            let services = source.current().await?;
            for svc in services {
                catalog.update_service(svc).await;
            }
            Ok(())
        }
    })
    .await
}

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sidecar_catalog::{CatalogState, Listener};

use crate::looper::{wait_tick, Tick};

/// One iteration of spec §4.6's `TrackLocalListeners`: newly-desired
/// listeners are added, managed listeners no longer desired are removed.
/// Unmanaged listeners (registered by hand, e.g. a one-off debug subscriber)
/// are never touched.
pub async fn reconcile(catalog: &Arc<CatalogState>, wanted: Vec<Arc<dyn Listener>>) {
    let wanted_names: HashSet<String> = wanted.iter().map(|l| l.name().to_string()).collect();

    for listener in wanted {
        if !catalog.listeners().contains(listener.name()).await {
            if let Err(err) = catalog.add_listener(listener.clone()).await {
                tracing::warn!(listener = listener.name(), error = %err, "failed to add managed listener");
            }
        }
    }

    for name in catalog.managed_listener_names().await {
        if !wanted_names.contains(&name) {
            if let Err(err) = catalog.remove_listener(&name).await {
                tracing::warn!(listener = %name, error = %err, "failed to remove stale managed listener");
            }
        }
    }
}

/// Periodically reconciles the catalog's managed-listener set against
/// whatever `desired` currently reports (spec §4.6).
pub async fn run<F, Fut>(
    catalog: Arc<CatalogState>,
    period: Duration,
    mut shutdown: impl Future<Output = ()> + Unpin,
    mut desired: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<Arc<dyn Listener>>>>,
{
    let mut ticker = tokio::time::interval(period);
    loop {
        match wait_tick(&mut ticker, &mut shutdown).await {
            Tick::Shutdown => {
                tracing::info!("listener tracker received shutdown signal");
                break;
            }
            Tick::Fire => {
                let wanted = match desired().await {
                    Ok(listeners) => listeners,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to compute desired listener set; skipping reconcile");
                        continue;
                    }
                };
                reconcile(&catalog, wanted).await;
            }
        }
    }
}

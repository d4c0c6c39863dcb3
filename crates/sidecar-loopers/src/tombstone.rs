use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sidecar_adapters::LocalServiceSource;
use sidecar_catalog::defaults::{ALIVE_LIFESPAN, DRAINING_LIFESPAN, TOMBSTONE_LIFESPAN};
use sidecar_catalog::{retransmit_batch, CatalogState, Service};
use tokio::sync::mpsc;

use crate::looper::{wait_tick, Tick};

#[derive(Debug, Clone, Copy)]
pub struct TombstoneConfig {
    pub tick_interval: Duration,
    pub alive_lifespan: Duration,
    pub draining_lifespan: Duration,
    pub tombstone_lifespan: Duration,
    pub tombstone_count: usize,
    pub retransmit_spacing: Duration,
}

impl Default for TombstoneConfig {
    fn default() -> Self {
        TombstoneConfig {
            tick_interval: sidecar_catalog::defaults::TOMBSTONE_INTERVAL,
            alive_lifespan: ALIVE_LIFESPAN,
            draining_lifespan: DRAINING_LIFESPAN,
            tombstone_lifespan: TOMBSTONE_LIFESPAN,
            tombstone_count: sidecar_catalog::defaults::TOMBSTONE_COUNT,
            retransmit_spacing: Duration::from_millis(100),
        }
    }
}

/// One iteration of spec §4.4: age out expired remote records, tombstone
/// local services discovery no longer reports, and return the combined
/// batch for the caller to retransmit.
pub async fn tick(catalog: &Arc<CatalogState>, source: &Arc<LocalServiceSource>, cfg: &TombstoneConfig) -> anyhow::Result<Vec<Service>> {
    let mut batch = catalog
        .age_and_expire(cfg.alive_lifespan, cfg.draining_lifespan, cfg.tombstone_lifespan)
        .await;

    match source.current().await {
        Ok(discovered) => {
            batch.extend(catalog.tombstone_missing_local(&discovered).await);
        }
        Err(err) => {
            // Propagate so the caller's looper logs it; the age/expire
            // half of this tick already happened and is not rolled back.
            return Err(err.context("failed to poll discovery for tombstone sweep"));
        }
    }

    Ok(batch)
}

/// Ages and expires remote records, and tombstones local services that
/// discovery no longer reports (spec §4.4), retransmitting the combined
/// batch `TOMBSTONE_COUNT` times.
pub async fn run(
    catalog: Arc<CatalogState>,
    source: Arc<LocalServiceSource>,
    cfg: TombstoneConfig,
    mut shutdown: impl Future<Output = ()> + Unpin,
) {
    let broadcast_tx = catalog.broadcast_sender();
    let mut ticker = tokio::time::interval(cfg.tick_interval);

    loop {
        match wait_tick(&mut ticker, &mut shutdown).await {
            Tick::Shutdown => {
                tracing::info!("tombstone loop received shutdown signal");
                break;
            }
            Tick::Fire => match tick(&catalog, &source, &cfg).await {
                Ok(batch) if !batch.is_empty() => {
                    spawn_retransmit(&broadcast_tx, batch, &cfg);
                }
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "tombstone iteration failed; continuing"),
            },
        }
    }
}

fn spawn_retransmit(broadcast_tx: &mpsc::Sender<Option<Vec<Service>>>, batch: Vec<Service>, cfg: &TombstoneConfig) {
    let tx = broadcast_tx.clone();
    let count = cfg.tombstone_count;
    let spacing = cfg.retransmit_spacing;
    tokio::spawn(async move {
        retransmit_batch(&tx, batch, count, spacing).await;
    });
}

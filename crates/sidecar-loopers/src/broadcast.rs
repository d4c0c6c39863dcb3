use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sidecar_catalog::service::{Service, ServiceId, Status};
use sidecar_catalog::{retransmit_batch, CatalogState};
use tokio::sync::mpsc;

use crate::looper::{wait_tick, Tick};

/// Tunables the broadcast loop needs beyond the catalog's own defaults
/// (spec §4.2, §4.3).
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    pub tick_interval: Duration,
    pub alive_broadcast_interval: Duration,
    pub alive_count: usize,
    pub retransmit_spacing: Duration,
}

struct LastBroadcast {
    at: DateTime<Utc>,
    status: Status,
}

/// The broadcast loop's own per-service bookkeeping of what it has already
/// announced — deliberately kept here rather than inside `CatalogState`,
/// which stays opaque to broadcast scheduling (spec §9).
#[derive(Default)]
pub struct BroadcastTracker {
    last_broadcast: HashMap<ServiceId, LastBroadcast>,
}

impl BroadcastTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// One iteration of spec §4.3: decide which local services to
    /// (re)announce, emit the batch (or a nil sentinel, so the delegate's
    /// `GetBroadcasts` never starves), and schedule `ALIVE_COUNT`
    /// retransmissions when the batch contains anything new.
    pub async fn tick(
        &mut self,
        catalog: &Arc<CatalogState>,
        broadcast_tx: &mpsc::Sender<Option<Vec<Service>>>,
        cfg: &BroadcastConfig,
    ) -> anyhow::Result<()> {
        let snapshot = catalog.snapshot().await;
        let local = snapshot
            .servers
            .get(catalog.hostname())
            .map(|server| server.services.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        let now = catalog.now();
        let mut included = Vec::new();
        let mut has_new = false;

        for svc in local {
            let is_new = match self.last_broadcast.get(&svc.id) {
                None => true,
                Some(prior) => prior.status != svc.status && svc.status != Status::Tombstone,
            };

            let should_include = if is_new {
                has_new = true;
                true
            } else {
                match self.last_broadcast.get(&svc.id).map(|p| p.at) {
                    None => true,
                    Some(at) => now - at >= chrono::Duration::from_std(cfg.alive_broadcast_interval).unwrap(),
                }
            };

            if should_include {
                self.last_broadcast.insert(
                    svc.id.clone(),
                    LastBroadcast {
                        at: now,
                        status: svc.status,
                    },
                );
                included.push(svc);
            }
        }

        if included.is_empty() {
            let _ = broadcast_tx.send(None).await;
            return Ok(());
        }

        if has_new {
            // The batch's first (unnudged) send IS this iteration's
            // emission; the remaining `alive_count - 1` repeats are
            // nudged so peers re-propagate them (spec §4.2, §4.3).
            let tx = broadcast_tx.clone();
            let count = cfg.alive_count;
            let spacing = cfg.retransmit_spacing;
            tokio::spawn(async move {
                retransmit_batch(&tx, included, count, spacing).await;
            });
        } else {
            let _ = broadcast_tx.send(Some(included)).await;
        }

        Ok(())
    }
}

/// Periodically (re)announces this host's own services (spec §4.3). Unlike
/// the catalog's internal `retransmit`, which skips local-origin records,
/// this loop is the sole path by which our own services reach the wire —
/// it reads the catalog's already-merged local records (populated by the
/// new-services tracker) rather than re-running discovery itself.
pub async fn run(catalog: Arc<CatalogState>, cfg: BroadcastConfig, mut shutdown: impl Future<Output = ()> + Unpin) {
    let broadcast_tx = catalog.broadcast_sender();
    let mut ticker = tokio::time::interval(cfg.tick_interval);
    let mut tracker = BroadcastTracker::new();

    loop {
        match wait_tick(&mut ticker, &mut shutdown).await {
            Tick::Shutdown => {
                tracing::info!("broadcast loop received shutdown signal");
                break;
            }
            Tick::Fire => {
                if let Err(err) = tracker.tick(&catalog, &broadcast_tx, &cfg).await {
                    tracing::error!(error = %err, "broadcast iteration failed; continuing");
                }
            }
        }
    }
}

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sidecar_catalog::defaults::TOMBSTONE_COUNT;
use sidecar_catalog::{retransmit_batch, CatalogState, Service, Snapshot};
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};

/// Opaque node metadata exchanged by the membership substrate's own
/// handshake, per spec §4.5's `NodeMeta`. The substrate stamps/filters by
/// cluster name before any message reaches [`Delegate`], so the delegate
/// itself never re-checks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMeta {
    pub cluster_name: String,
    pub name: String,
}

/// Bridges [`CatalogState`] to a SWIM-style membership substrate (spec
/// §4.5). The delegate holds no reference back into the catalog beyond
/// this struct's own fields — it reads the catalog's broadcast channel and
/// writes into its ingress channel, closing the loop from the outside
/// (spec §9's cyclic-reference note).
pub struct Delegate {
    cluster_name: String,
    catalog: Arc<CatalogState>,
    broadcast_rx: Mutex<mpsc::Receiver<Option<Vec<Service>>>>,
    pending: Mutex<VecDeque<Vec<u8>>>,
    max_pending_length: usize,
    retransmit_spacing: Duration,
}

impl Delegate {
    /// `max_pending_length` and `retransmit_spacing` come from the caller's
    /// `sidecar::Config` rather than `sidecar_catalog::defaults` directly,
    /// so an override there actually takes effect here (spec §4.5, §4.2).
    pub fn new(
        cluster_name: impl Into<String>,
        catalog: Arc<CatalogState>,
        broadcast_rx: mpsc::Receiver<Option<Vec<Service>>>,
        max_pending_length: usize,
        retransmit_spacing: Duration,
    ) -> Self {
        Delegate {
            cluster_name: cluster_name.into(),
            catalog,
            broadcast_rx: Mutex::new(broadcast_rx),
            pending: Mutex::new(VecDeque::new()),
            max_pending_length,
            retransmit_spacing,
        }
    }

    /// Opaque bytes describing our node, required to fit within `limit`.
    pub fn node_meta(&self, limit: usize) -> Result<Vec<u8>> {
        let meta = NodeMeta {
            cluster_name: self.cluster_name.clone(),
            name: self.catalog.hostname().to_string(),
        };
        let bytes = serde_json::to_vec(&meta).map_err(Error::EncodeMeta)?;
        if bytes.len() > limit {
            return Err(Error::NodeMetaTooLarge { limit });
        }
        Ok(bytes)
    }

    /// One incoming gossip payload: decode as a single [`Service`] and
    /// enqueue via `UpdateService`. Malformed payloads are logged and
    /// dropped, never propagated (spec §4.5, §7).
    pub async fn notify_msg(&self, payload: &[u8]) {
        match serde_json::from_slice::<Service>(payload) {
            Ok(svc) => self.catalog.update_service(svc).await,
            Err(err) => tracing::warn!(error = %err, "dropping malformed gossip payload"),
        }
    }

    /// Pull up to one batch from the catalog's broadcast channel, prepend
    /// previously leftover payloads, and pack as many as fit within
    /// `limit - overhead` bytes. Leftovers are stashed for the next call,
    /// capped at `max_pending_length` with the oldest dropped first so the
    /// freshest messages are always preferred (spec §4.5, resolved Open
    /// Question in DESIGN.md).
    pub async fn get_broadcasts(&self, overhead: usize, limit: usize) -> Vec<Vec<u8>> {
        let mut combined: VecDeque<Vec<u8>> = {
            let mut pending = self.pending.lock().await;
            std::mem::take(&mut *pending)
        };

        if let Some(batch) = self.pull_fresh_batch().await {
            for svc in batch {
                match serde_json::to_vec(&svc) {
                    Ok(bytes) => combined.push_back(bytes),
                    Err(err) => tracing::error!(error = %err, "failed to encode outgoing service"),
                }
            }
        }

        let budget = limit.saturating_sub(overhead);
        let mut packed = Vec::new();
        let mut used = 0usize;
        while let Some(front) = combined.front() {
            if used + front.len() > budget {
                break;
            }
            used += front.len();
            packed.push(combined.pop_front().expect("front just peeked"));
        }

        let mut pending = self.pending.lock().await;
        *pending = combined;
        while pending.len() > self.max_pending_length {
            pending.pop_front();
        }

        packed
    }

    async fn pull_fresh_batch(&self) -> Option<Vec<Service>> {
        let mut rx = self.broadcast_rx.lock().await;
        rx.try_recv().ok().flatten()
    }

    /// The catalog's `Encode()`, handed to a joining peer for anti-entropy.
    pub async fn local_state(&self, _join: bool) -> Result<Vec<u8>> {
        self.catalog.encode().await.map_err(Error::EncodeState)
    }

    /// Decode and merge a peer's full state. Invalid payloads are logged
    /// and dropped (spec §4.5, §7).
    pub async fn merge_remote_state(&self, buf: &[u8], _join: bool) {
        match Snapshot::decode(buf).map_err(Error::DecodeState) {
            Ok(snapshot) => self.catalog.merge(&snapshot).await,
            Err(err) => tracing::warn!(error = %err, "dropping malformed anti-entropy payload"),
        }
    }

    pub fn notify_join(&self, node: &NodeMeta) {
        tracing::info!(host = %node.name, "peer joined");
    }

    pub fn notify_update(&self, node: &NodeMeta) {
        tracing::debug!(host = %node.name, "peer metadata updated");
    }

    /// On leave, tombstone the departed host's services in a separate task
    /// so the substrate's notification callback is never blocked on the
    /// catalog's write lock (spec §4.5, §5), then retransmit the produced
    /// tombstones `TOMBSTONE_COUNT` times so peers actually learn of the
    /// departure over gossip instead of each independently waiting out
    /// `ALIVE_LIFESPAN`/`TOMBSTONE_LIFESPAN` aging (spec §4.1, §4.7, E2E
    /// scenario 4 in §8).
    pub fn notify_leave(&self, node: &NodeMeta) {
        let catalog = self.catalog.clone();
        let hostname = node.name.clone();
        let spacing = self.retransmit_spacing;
        tokio::spawn(async move {
            let tombstones = catalog.expire_server(&hostname).await;
            if tombstones.is_empty() {
                return;
            }
            let tx = catalog.broadcast_sender();
            retransmit_batch(&tx, tombstones, TOMBSTONE_COUNT, spacing).await;
        });
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};

use crate::clock::Clock;
use crate::defaults::TOMBSTONE_AGING_NUDGE;
use crate::error::{Error, Result};
use crate::listener::{ChangeEvent, Listener, ListenerRegistry};
use crate::server::Server;
use crate::service::{Hostname, Service, ServiceId, Status};

/// A point-in-time, deep-copied view of the catalog's host -> server map
/// (spec §3, §6's "by host" snapshot format), and the unit `Encode`/`Decode`
/// and `Merge` operate on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub servers: HashMap<Hostname, Server>,
}

impl Snapshot {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::Decode)
    }

    /// The raw `Hostname -> Server` map itself, in the "by host" shape the
    /// HTTP boundary serves (spec §6). `Snapshot` already deep-copies on
    /// construction, so this is a plain clone of the field.
    pub fn by_host(&self) -> HashMap<Hostname, Server> {
        self.servers.clone()
    }

    /// Group every service across every server by its logical name, in the
    /// "by service name" shape the HTTP boundary serves (spec §6). Services
    /// within a name are ordered by ID for determinism.
    pub fn by_service(&self) -> HashMap<String, Vec<Service>> {
        let mut grouped: HashMap<String, Vec<Service>> = HashMap::new();
        for server in self.servers.values() {
            for svc in server.services.values() {
                grouped.entry(svc.name.clone()).or_default().push(svc.clone());
            }
        }
        for services in grouped.values_mut() {
            services.sort_by(|a, b| a.id.cmp(&b.id));
        }
        grouped
    }
}

/// The shared, process-wide catalog: a mapping of hostname to [`Server`],
/// the merge/reconciliation rules, tombstone lifecycle, change-event
/// fan-out, and encode/decode (spec §3, §4.1).
///
/// The catalog never holds a reference back to the membership delegate or
/// to any listener beyond the registry: it exposes a read-side broadcast
/// channel and a write-side ingress channel, and callers close the loop
/// (spec §9's "cyclic references" redesign note).
pub struct CatalogState {
    servers: RwLock<HashMap<Hostname, Server>>,
    last_changed: RwLock<DateTime<Utc>>,
    cluster_name: String,
    hostname: Hostname,
    ingress_tx: mpsc::Sender<Service>,
    broadcast_tx: mpsc::Sender<Option<Vec<Service>>>,
    listeners: ListenerRegistry,
    clock: Arc<dyn Clock>,
}

/// Channels handed back by [`CatalogState::new`] for the two background
/// tasks that complete the catalog's wiring (spec §5): the ingress drainer
/// and whatever forwards broadcast batches to the membership delegate.
pub struct CatalogChannels {
    pub ingress_rx: mpsc::Receiver<Service>,
    pub broadcast_rx: mpsc::Receiver<Option<Vec<Service>>>,
}

impl CatalogState {
    pub fn new(
        cluster_name: impl Into<String>,
        hostname: impl Into<String>,
        ingress_capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> (Arc<Self>, CatalogChannels) {
        let (ingress_tx, ingress_rx) = mpsc::channel(ingress_capacity.max(1));
        let (broadcast_tx, broadcast_rx) = mpsc::channel(1);

        let now = clock.now();
        let state = Arc::new(CatalogState {
            servers: RwLock::new(HashMap::new()),
            last_changed: RwLock::new(now),
            cluster_name: cluster_name.into(),
            hostname: hostname.into(),
            ingress_tx,
            broadcast_tx,
            listeners: ListenerRegistry::new(),
            clock,
        });
        (state, CatalogChannels { ingress_rx, broadcast_rx })
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The catalog's notion of "now", via its [`Clock`] seam (spec §5).
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Enqueue a service for merge (spec §4.1's `UpdateService`). The
    /// ingress queue is bounded; a full queue suspends the caller, giving
    /// the bounded channel's natural back-pressure to discovery/health
    /// loops that outrun the serializer task (spec §5).
    pub async fn update_service(&self, svc: Service) {
        // Closed channel means the ingress drainer has shut down; there is
        // nothing left to do with the update.
        let _ = self.ingress_tx.send(svc).await;
    }

    /// Drain the ingress channel and merge each arriving service. This is
    /// the catalog's single serializer task (spec §5): every mutation goes
    /// through here, so merges across concurrently-polled discovery and
    /// gossip sources are strictly ordered by the write lock.
    pub async fn run_ingress(self: Arc<Self>, mut ingress_rx: mpsc::Receiver<Service>) {
        while let Some(svc) = ingress_rx.recv().await {
            self.add_service_entry(svc).await;
        }
    }

    /// The atomic merge step (spec §4.1's `AddServiceEntry`).
    async fn add_service_entry(&self, mut new: Service) {
        let now = self.clock.now();
        let mut servers = self.servers.write().await;
        let server = servers
            .entry(new.hostname.clone())
            .or_insert_with(|| Server::new(new.hostname.clone(), now));

        match server.services.get(&new.id) {
            None => {
                server.last_updated = now;
                server.last_changed = now;
                let event = ChangeEvent {
                    service: new.clone(),
                    previous_status: Status::Unknown,
                    changed_at: now,
                };
                server.services.insert(new.id.clone(), new.clone());
                drop(servers);
                *self.last_changed.write().await = now;
                self.listeners.notify(event).await;
                self.retransmit(new).await;
            }
            Some(old) => {
                if !new.invalidates(old) {
                    // Does not invalidate: drop silently. This is what
                    // breaks retransmit loops (spec §4.1, tested by §8).
                    return;
                }

                server.last_updated = now;

                // DRAINING is sticky against ALIVE (spec §3, §8).
                if old.status == Status::Draining && new.status == Status::Alive {
                    new.status = Status::Draining;
                }

                let status_changed = new.status != old.status;
                let previous_status = old.status;

                if status_changed {
                    server.last_changed = now;
                }
                server.services.insert(new.id.clone(), new.clone());
                drop(servers);

                if status_changed {
                    *self.last_changed.write().await = now;
                    self.listeners
                        .notify(ChangeEvent {
                            service: new.clone(),
                            previous_status,
                            changed_at: now,
                        })
                        .await;
                }
                self.retransmit(new).await;
            }
        }
    }

    /// Push a freshly stored record onto the outgoing broadcast channel,
    /// unless it originated from this host: the dedicated broadcast loop
    /// (spec §4.3) already covers propagating our own local services, so
    /// re-queuing them here would double-send (spec §4.1).
    async fn retransmit(&self, svc: Service) {
        if svc.hostname == self.hostname {
            return;
        }
        let _ = self.broadcast_tx.send(Some(vec![svc])).await;
    }

    /// Merge every service of every server of `other` into this catalog
    /// (spec §4.1's `Merge`), used on anti-entropy full-state reception.
    pub async fn merge(&self, other: &Snapshot) {
        for server in other.servers.values() {
            for svc in server.services.values() {
                self.update_service(svc.clone()).await;
            }
        }
    }

    /// A deep-copied view of the full host -> server map (spec §3's
    /// ownership rule: consumers must never race the catalog's mutator).
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            servers: self.servers.read().await.clone(),
        }
    }

    pub async fn encode(&self) -> Result<Vec<u8>> {
        self.snapshot().await.encode()
    }

    pub async fn by_service(&self) -> HashMap<String, Vec<Service>> {
        self.snapshot().await.by_service()
    }

    pub async fn by_host(&self) -> HashMap<Hostname, Server> {
        self.snapshot().await.by_host()
    }

    pub async fn get_local_service_by_id(&self, id: &str) -> Option<Service> {
        self.servers
            .read()
            .await
            .get(&self.hostname)
            .and_then(|server| server.services.get(id))
            .cloned()
    }

    /// Tombstone every live service of a departed host in one atomic step
    /// (spec §4.1's `ExpireServer`), returning the tombstones produced so
    /// the caller can retransmit them `TOMBSTONE_COUNT` times. Returns an
    /// empty batch (and emits nothing) if the server has no live services.
    pub async fn expire_server(&self, hostname: &str) -> Vec<Service> {
        let now = self.clock.now();
        let mut servers = self.servers.write().await;
        let Some(server) = servers.get_mut(hostname) else {
            return Vec::new();
        };

        let mut tombstones = Vec::new();
        let mut events = Vec::new();
        for svc in server.services.values_mut() {
            if svc.is_tombstone() {
                continue;
            }
            let previous_status = svc.status;
            svc.tombstone_at(now);
            tombstones.push(svc.clone());
            events.push((svc.clone(), previous_status));
        }
        if tombstones.is_empty() {
            return tombstones;
        }
        server.last_updated = now;
        server.last_changed = now;
        drop(servers);

        *self.last_changed.write().await = now;
        for (svc, previous_status) in events {
            self.listeners
                .notify(ChangeEvent {
                    service: svc,
                    previous_status,
                    changed_at: now,
                })
                .await;
        }
        tombstones
    }

    /// Walk every service of every server, deleting expired tombstones and
    /// tombstoning expired live records (spec §4.4's `TombstoneOthersServices`).
    /// Returns the newly-minted tombstones to add to the outgoing batch.
    pub async fn age_and_expire(
        &self,
        alive_lifespan: std::time::Duration,
        draining_lifespan: std::time::Duration,
        tombstone_lifespan: std::time::Duration,
    ) -> Vec<Service> {
        let now = self.clock.now();
        let mut servers = self.servers.write().await;
        let mut newly_tombstoned = Vec::new();
        let mut events = Vec::new();
        let mut emptied_hosts = Vec::new();

        for (hostname, server) in servers.iter_mut() {
            let mut to_delete = Vec::new();
            let mut changed = false;

            for (id, svc) in server.services.iter_mut() {
                if svc.is_tombstone() {
                    if now - svc.updated > chrono::Duration::from_std(tombstone_lifespan).unwrap() {
                        to_delete.push(id.clone());
                    }
                    continue;
                }

                let lifespan = if svc.status == Status::Draining {
                    draining_lifespan
                } else {
                    alive_lifespan
                };
                if now - svc.updated > chrono::Duration::from_std(lifespan).unwrap() {
                    let previous_status = svc.status;
                    svc.tombstone_at(svc.updated + TOMBSTONE_AGING_NUDGE);
                    newly_tombstoned.push(svc.clone());
                    events.push((svc.clone(), previous_status));
                    changed = true;
                }
            }
            for id in &to_delete {
                server.services.remove(id);
            }
            if changed || !to_delete.is_empty() {
                server.last_updated = now;
                if changed {
                    server.last_changed = now;
                }
            }
            if server.is_empty() {
                emptied_hosts.push(hostname.clone());
            }
        }
        for hostname in emptied_hosts {
            servers.remove(&hostname);
        }
        drop(servers);

        if !newly_tombstoned.is_empty() {
            *self.last_changed.write().await = now;
            for (svc, previous_status) in events {
                self.listeners
                    .notify(ChangeEvent {
                        service: svc,
                        previous_status,
                        changed_at: now,
                    })
                    .await;
            }
        }
        newly_tombstoned
    }

    /// Tombstone every service this host owns that is no longer in
    /// `currently_discovered` (spec §4.4's `TombstoneServices`). The
    /// returned batch contains each tombstone twice, per spec's explicit
    /// double-send for delivery reliability.
    pub async fn tombstone_missing_local(&self, currently_discovered: &[Service]) -> Vec<Service> {
        let now = self.clock.now();
        let present: std::collections::HashSet<&ServiceId> =
            currently_discovered.iter().map(|s| &s.id).collect();

        let mut servers = self.servers.write().await;
        let Some(server) = servers.get_mut(&self.hostname) else {
            return Vec::new();
        };

        let mut tombstones = Vec::new();
        let mut events = Vec::new();
        for svc in server.services.values_mut() {
            if svc.is_tombstone() || present.contains(&svc.id) {
                continue;
            }
            let previous_status = svc.status;
            svc.tombstone_at(now);
            tombstones.push(svc.clone());
            tombstones.push(svc.clone());
            events.push((svc.clone(), previous_status));
        }
        if tombstones.is_empty() {
            return tombstones;
        }
        server.last_updated = now;
        server.last_changed = now;
        drop(servers);

        *self.last_changed.write().await = now;
        for (svc, previous_status) in events {
            self.listeners
                .notify(ChangeEvent {
                    service: svc,
                    previous_status,
                    changed_at: now,
                })
                .await;
        }
        tombstones
    }

    pub async fn add_listener(&self, listener: Arc<dyn Listener>) -> Result<()> {
        self.listeners.add(listener).await
    }

    pub async fn remove_listener(&self, name: &str) -> Result<()> {
        self.listeners.remove(name).await
    }

    pub async fn managed_listener_names(&self) -> Vec<String> {
        self.listeners.managed_names().await
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Borrow the broadcast egress sender, for the broadcast loop to push
    /// its own per-tick batches alongside the catalog's own retransmits.
    pub fn broadcast_sender(&self) -> mpsc::Sender<Option<Vec<Service>>> {
        self.broadcast_tx.clone()
    }
}

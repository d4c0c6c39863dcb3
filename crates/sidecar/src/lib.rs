//! Wires the catalog, membership delegate, and background loopers into one
//! running node (spec §2, §5). This crate is the only one that owns a
//! `tokio` runtime's worth of spawned tasks; `sidecar-catalog`,
//! `sidecar-membership`, `sidecar-adapters` and `sidecar-loopers` stay
//! runtime-agnostic beyond requiring `tokio` primitives.

pub mod config;
pub mod logging;

use std::sync::Arc;

use sidecar_adapters::{DiscoveryAdapter, HealthAdapter, LocalServiceSource};
use sidecar_catalog::{CatalogState, Listener};
use sidecar_loopers::broadcast::BroadcastConfig;
use sidecar_loopers::tombstone::TombstoneConfig;
use sidecar_membership::Delegate;
use tokio_util::sync::CancellationToken;

pub use config::Config;

/// A running node: the catalog plus every background looper spec §5 names,
/// spawned and tracked so they can be cancelled together on shutdown.
pub struct Sidecar {
    catalog: Arc<CatalogState>,
    delegate: Arc<Delegate>,
    cancel: CancellationToken,
}

impl Sidecar {
    /// Builds the catalog and its membership delegate. Does not spawn any
    /// loopers yet — call [`Sidecar::run`] for that, once a discovery/health
    /// adapter pair and a desired-listener source are in hand.
    pub fn new(cfg: &Config, cluster_name: impl Into<String>, hostname: impl Into<String>) -> Arc<Sidecar> {
        let clock = Arc::new(sidecar_catalog::UtcClock::default());
        let (catalog, channels) = CatalogState::new(cluster_name.into(), hostname, cfg.ingress_capacity, clock);

        tokio::spawn(catalog.clone().run_ingress(channels.ingress_rx));

        let delegate = Arc::new(Delegate::new(
            catalog.cluster_name().to_string(),
            catalog.clone(),
            channels.broadcast_rx,
            cfg.max_pending_length,
            cfg.retransmit_spacing,
        ));

        Arc::new(Sidecar {
            catalog,
            delegate,
            cancel: CancellationToken::new(),
        })
    }

    pub fn catalog(&self) -> &Arc<CatalogState> {
        &self.catalog
    }

    /// The delegate a membership substrate binds to for `GetBroadcasts`,
    /// `NotifyMsg`, `LocalState`, `MergeRemoteState`, and join/leave/update
    /// callbacks (spec §4.5). This crate does not itself embed a gossip
    /// substrate — wiring `delegate()` into one is the binary's job.
    pub fn delegate(&self) -> &Arc<Delegate> {
        &self.delegate
    }

    /// Spawns the broadcast, tombstone, and new-services loopers (spec §5).
    /// Returns immediately; the loopers run until [`Sidecar::shutdown`] is
    /// called. `desired_listeners` feeds the listener tracker (spec §4.6).
    pub fn run<F, Fut>(
        self: &Arc<Self>,
        cfg: Config,
        discovery: Arc<dyn DiscoveryAdapter>,
        health: Arc<dyn HealthAdapter>,
        desired_listeners: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = anyhow::Result<Vec<Arc<dyn Listener>>>> + Send,
    {
        let source = Arc::new(LocalServiceSource::new(discovery, health));

        tokio::spawn(sidecar_loopers::new_services::run(
            source.clone(),
            self.catalog.clone(),
            cfg.new_services_tick_interval,
            Box::pin(self.cancel.clone().cancelled_owned()),
        ));

        let broadcast_cfg = BroadcastConfig {
            tick_interval: cfg.broadcast_tick_interval,
            alive_broadcast_interval: cfg.alive_broadcast_interval,
            alive_count: cfg.alive_count,
            retransmit_spacing: cfg.retransmit_spacing,
        };
        tokio::spawn(sidecar_loopers::broadcast::run(
            self.catalog.clone(),
            broadcast_cfg,
            Box::pin(self.cancel.clone().cancelled_owned()),
        ));

        let tombstone_cfg = TombstoneConfig {
            tick_interval: cfg.tombstone_tick_interval,
            alive_lifespan: cfg.alive_lifespan,
            draining_lifespan: cfg.draining_lifespan,
            tombstone_lifespan: cfg.tombstone_lifespan,
            tombstone_count: cfg.tombstone_count,
            retransmit_spacing: cfg.retransmit_spacing,
        };
        tokio::spawn(sidecar_loopers::tombstone::run(
            self.catalog.clone(),
            source,
            tombstone_cfg,
            Box::pin(self.cancel.clone().cancelled_owned()),
        ));

        tokio::spawn(sidecar_loopers::listener_tracker::run(
            self.catalog.clone(),
            cfg.listener_tick_interval,
            Box::pin(self.cancel.clone().cancelled_owned()),
            desired_listeners,
        ));
    }

    /// Cooperatively stops every spawned looper. Does not await their
    /// completion — callers that need that should track the `JoinHandle`s
    /// themselves (this facade intentionally doesn't, matching the
    /// fire-and-forget spawn style the teacher uses for its own background
    /// task dequeue loop).
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

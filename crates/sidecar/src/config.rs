//! Tunables a caller can override without touching core logic (spec §7's
//! "Configuration" addendum). Loading these from TOML/env/CLI flags is this
//! binary's job, not the core crates'.

use std::time::Duration;

use sidecar_catalog::defaults;

/// Every interval and multiplicity spec.md §4.2 calls out as tunable, plus
/// the retransmit spacing spec.md §4.2/§4.3 leaves as "the configured
/// retransmit interval" without pinning a default.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub alive_broadcast_interval: Duration,
    pub alive_lifespan: Duration,
    pub draining_lifespan: Duration,
    pub tombstone_lifespan: Duration,
    pub alive_count: usize,
    pub tombstone_count: usize,
    pub max_pending_length: usize,
    pub ingress_capacity: usize,
    pub broadcast_tick_interval: Duration,
    pub tombstone_tick_interval: Duration,
    pub listener_tick_interval: Duration,
    pub new_services_tick_interval: Duration,
    pub retransmit_spacing: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alive_broadcast_interval: defaults::ALIVE_BROADCAST_INTERVAL,
            alive_lifespan: defaults::ALIVE_LIFESPAN,
            draining_lifespan: defaults::DRAINING_LIFESPAN,
            tombstone_lifespan: defaults::TOMBSTONE_LIFESPAN,
            alive_count: defaults::ALIVE_COUNT,
            tombstone_count: defaults::TOMBSTONE_COUNT,
            max_pending_length: defaults::MAX_PENDING_LENGTH,
            ingress_capacity: defaults::INGRESS_CAPACITY,
            broadcast_tick_interval: defaults::BROADCAST_INTERVAL,
            tombstone_tick_interval: defaults::TOMBSTONE_INTERVAL,
            listener_tick_interval: Duration::from_secs(5),
            new_services_tick_interval: Duration::from_secs(5),
            retransmit_spacing: Duration::from_millis(100),
        }
    }
}

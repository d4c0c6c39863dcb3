//! Default tunables for the catalog's lifecycle timers, per spec §4.2.
//!
//! These are plain constants rather than a config-loading layer: loading
//! them from TOML/env is a bootstrap-layer concern outside this core
//! (spec §1). Callers that want different values construct their own
//! `sidecar::config::Config` (in the `sidecar` facade crate) instead of
//! touching these.

use std::time::Duration;

/// Upper bound between refresh broadcasts for an unchanged local service.
pub const ALIVE_BROADCAST_INTERVAL: Duration = Duration::from_secs(60);

/// If no newer record is received within this window, a service is tombstoned.
pub const ALIVE_LIFESPAN: Duration = Duration::from_secs(80);

/// Longer tolerance before tombstoning a draining service.
pub const DRAINING_LIFESPAN: Duration = Duration::from_secs(10 * 60);

/// After this, a tombstoned record is removed entirely.
pub const TOMBSTONE_LIFESPAN: Duration = Duration::from_secs(3 * 60 * 60);

/// Per-event retransmit multiplicity for a freshly observed alive service.
pub const ALIVE_COUNT: usize = 5;

/// Per-event retransmit multiplicity for a tombstone.
pub const TOMBSTONE_COUNT: usize = 10;

/// Cap on the delegate's leftover-broadcast queue (spec §4.5, §5).
pub const MAX_PENDING_LENGTH: usize = 100;

/// Capacity of the catalog's service-message ingress channel (spec §5).
pub const INGRESS_CAPACITY: usize = 25;

/// Cadence of the broadcast loop (spec §4.3).
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the tombstone loop (spec §4.4).
pub const TOMBSTONE_INTERVAL: Duration = Duration::from_secs(2);

/// The per-retransmission timestamp nudge that keeps retransmissions
/// monotonically "newer" without ever invalidating a true update (spec §4.2).
pub const RETRANSMIT_NUDGE: chrono::Duration = chrono::Duration::nanoseconds(50);

/// The fixed nudge applied when aging a remote tombstone (spec §3, §8): exactly
/// one second, never "now", so the aging event can't invalidate a newer record.
pub const TOMBSTONE_AGING_NUDGE: chrono::Duration = chrono::Duration::seconds(1);

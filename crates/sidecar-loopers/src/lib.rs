//! The periodic background tasks that drive the catalog: a uniform
//! looper abstraction plus the broadcast, tombstone, new-services, and
//! listener-tracking loops built on it (spec §4.3, §4.4, §4.6, §5, §9).

pub mod broadcast;
pub mod listener_tracker;
pub mod looper;
pub mod new_services;
pub mod tombstone;

pub use broadcast::BroadcastConfig;
pub use looper::Tick;
pub use sidecar_catalog::retransmit_batch;
pub use tombstone::TombstoneConfig;

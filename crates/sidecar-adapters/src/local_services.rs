use std::sync::Arc;

use sidecar_catalog::Service;

use crate::discovery::DiscoveryAdapter;
use crate::health::HealthAdapter;

/// Composes a [`DiscoveryAdapter`] and a [`HealthAdapter`] into the single
/// "current local services" source that the broadcast and tombstone
/// loopers consume on their periodic cadence (spec §6). Kept out of
/// `sidecar-catalog` itself, which stays discovery- and health-opaque.
pub struct LocalServiceSource {
    discovery: Arc<dyn DiscoveryAdapter>,
    health: Arc<dyn HealthAdapter>,
}

impl LocalServiceSource {
    pub fn new(discovery: Arc<dyn DiscoveryAdapter>, health: Arc<dyn HealthAdapter>) -> Self {
        LocalServiceSource { discovery, health }
    }

    /// Discover, then apply health, in that order (spec §6's stated
    /// pipeline: "health checking ... supplies the status of locally
    /// discovered services").
    pub async fn current(&self) -> anyhow::Result<Vec<Service>> {
        let discovered = self.discovery.discover().await?;
        self.health.check(discovered).await
    }
}

use sidecar_catalog::Service;

/// Supplies local health state (spec §6): takes the services a
/// [`crate::discovery::DiscoveryAdapter`] just discovered and returns them
/// with `Status` set to ALIVE/UNHEALTHY/UNKNOWN/DRAINING according to
/// local checks. Broadcast and tombstone loopers consume this same shape.
#[async_trait::async_trait]
pub trait HealthAdapter: Send + Sync + 'static {
    async fn check(&self, services: Vec<Service>) -> anyhow::Result<Vec<Service>>;
}

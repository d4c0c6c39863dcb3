use sidecar_catalog::Service;

use crate::health::HealthAdapter;

/// A [`HealthAdapter`] that trusts whatever status the discovery adapter
/// already assigned — the right default when health is determined at
/// discovery time (e.g. a container runtime that already reports health).
pub struct PassthroughHealth;

#[async_trait::async_trait]
impl HealthAdapter for PassthroughHealth {
    async fn check(&self, services: Vec<Service>) -> anyhow::Result<Vec<Service>> {
        Ok(services)
    }
}

use sidecar_catalog::Service;

/// Supplies the current set of locally-present services (spec §6):
/// container runtime queries, static files, or any other source. Ports,
/// names, and proxy mode are resolved by the adapter before the catalog
/// ever sees a [`Service`] — the catalog itself stays name-opaque.
#[async_trait::async_trait]
pub trait DiscoveryAdapter: Send + Sync + 'static {
    async fn discover(&self) -> anyhow::Result<Vec<Service>>;
}

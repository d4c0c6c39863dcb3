use std::path::PathBuf;

use anyhow::Context;
use sidecar_catalog::Service;

use crate::discovery::DiscoveryAdapter;

/// Reads the locally-present service list from a JSON file on each poll
/// (spec §6's "static files" discovery source) — the simplest adapter,
/// useful for hosts whose services don't come from a container runtime.
pub struct StaticFileDiscovery {
    path: PathBuf,
}

impl StaticFileDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StaticFileDiscovery { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DiscoveryAdapter for StaticFileDiscovery {
    async fn discover(&self) -> anyhow::Result<Vec<Service>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading discovery file {}", self.path.display()))?;
        let services: Vec<Service> =
            serde_json::from_slice(&bytes).with_context(|| format!("parsing discovery file {}", self.path.display()))?;
        Ok(services)
    }
}

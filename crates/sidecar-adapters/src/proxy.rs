use std::collections::HashMap;

use sidecar_catalog::Service;

/// The contract a proxy configuration writer implements (spec §6): consume
/// a whole-state "by service name" snapshot on demand to render a fresh
/// configuration. Writers additionally subscribe as a
/// [`sidecar_catalog::Listener`] to know when to re-render; that capability
/// set lives in `sidecar-catalog` itself, since it is the catalog's own
/// fan-out contract rather than an adapter-specific one.
#[async_trait::async_trait]
pub trait ProxyConfigWriter: Send + Sync + 'static {
    async fn render(&self, by_service: &HashMap<String, Vec<Service>>) -> anyhow::Result<()>;
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sidecar::Config;
use sidecar_adapters::{PassthroughHealth, StaticFileDiscovery};
use sidecar_catalog::Listener;

/// A node in a decentralized services catalog, gossiping local service
/// presence/health to peers and surfacing an eventually-consistent catalog
/// for proxies and subscribers to consume.
#[derive(clap::Parser, Debug)]
#[clap(about = "Sidecar: decentralized service discovery and gossip core")]
struct Args {
    /// Cluster name. Peers with a mismatched name ignore our gossip.
    #[clap(long, env = "SIDECAR_CLUSTER_NAME")]
    cluster_name: String,

    /// This host's name, as advertised to peers.
    #[clap(long, env = "SIDECAR_HOSTNAME")]
    hostname: String,

    /// Path to a JSON file listing locally-present services, re-read on
    /// every discovery tick. A container-runtime-backed `DiscoveryAdapter`
    /// plugs in the same way for deployments that need one.
    #[clap(long, env = "SIDECAR_SERVICES_FILE")]
    services_file: std::path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    sidecar::logging::install();

    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cfg = Config::default();
    let node = sidecar::Sidecar::new(&cfg, args.cluster_name, args.hostname);

    let discovery = Arc::new(StaticFileDiscovery::new(args.services_file));
    let health = Arc::new(PassthroughHealth);

    node.run(cfg, discovery, health, || async { Ok(Vec::<Arc<dyn Listener>>::new()) });

    tracing::info!(hostname = %node.catalog().hostname(), "sidecar node started");

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutdown signal received");
    node.shutdown();

    Ok(())
}

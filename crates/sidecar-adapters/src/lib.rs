//! The narrow external-collaborator contracts the core plugs into:
//! discovery, health, and proxy/subscriber boundaries (spec §1, §6).

pub mod discovery;
pub mod health;
pub mod local_services;
pub mod passthrough_health;
pub mod proxy;
pub mod static_file;

pub use discovery::DiscoveryAdapter;
pub use health::HealthAdapter;
pub use local_services::LocalServiceSource;
pub use passthrough_health::PassthroughHealth;
pub use proxy::ProxyConfigWriter;
pub use static_file::StaticFileDiscovery;

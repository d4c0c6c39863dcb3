//! Subscriber bootstrap, trimmed down from the teacher's own
//! `dekaf::logging::install` — a single `fmt` layer filtered by `RUST_LOG`,
//! without the Gazette log-forwarding layer this project has no use for.

use tracing_subscriber::prelude::*;

pub fn install() {
    let fmt_layer = tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr).with_filter(
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .from_env_lossy(),
    );

    tracing_subscriber::registry().with(fmt_layer).init();
}

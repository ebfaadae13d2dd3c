//! Logging setup.

use std::env;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr, honoring `RUST_LOG`.
pub fn init() {
    let default_filter = if cfg!(debug_assertions) {
        "inesfix=debug,inesfix_core=debug"
    } else {
        "inesfix=info,inesfix_core=info"
    }
    .parse::<Targets>()
    .expect("valid filter");
    let filter = match env::var("RUST_LOG") {
        Ok(filter) => filter.parse::<Targets>().unwrap_or(default_filter),
        Err(_) => default_filter,
    };

    let registry = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .compact()
            .without_time()
            .with_writer(std::io::stderr),
    );
    if let Err(err) = registry.try_init() {
        eprintln!("initializing tracing failed: {err:?}");
    }
}

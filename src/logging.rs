//! Tracing setup.
//!
//! Log level is read from `TRYON_LOG` (e.g. `TRYON_LOG=debug` or
//! `TRYON_LOG=outfit_tryon=debug,tower_http=info`), defaulting to `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TRYON_LOG";

pub fn init() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}

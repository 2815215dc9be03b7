//! Tracing setup for the service binary.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, defaulting to `info` globally and `debug`
/// for this crate. Safe to call once per process; library users who want
/// their own subscriber simply skip this.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,stepweave=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
        .init();
}

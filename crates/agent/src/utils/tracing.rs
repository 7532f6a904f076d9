use std::sync::Once;

use time::format_description::well_known::Iso8601;
use tracing_subscriber::{
    fmt::{format::Pretty, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use tracing_web::{performance_layer, MakeWebConsoleWriter};

/// Default filter for the worker. There's no environment in a service worker so
/// `EnvFilter::from_default_env` would always be empty
pub const DEFAULT_FILTER: &str = "agent=debug,service_worker=debug,info";

pub fn configure_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false) // Only partially supported across browsers
        .with_timer(UtcTime::new(Iso8601::DEFAULT))
        .with_writer(MakeWebConsoleWriter::new()); // write events to the console
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    // Install these as subscribers to tracing events
    tracing_subscriber::registry()
        .with(EnvFilter::new(DEFAULT_FILTER))
        .with(fmt_layer)
        .with(perf_layer)
        .init();
}

/// Configures tracing inside a Once block so multiple calls don't panic
///
/// The browser may spin the worker down and back up between events, each
/// entry point calls this
pub fn configure_tracing_once() {
    static ONCE: Once = Once::new();
    ONCE.call_once(configure_tracing);
}

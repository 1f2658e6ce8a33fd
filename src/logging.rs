use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when RUST_LOG is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "campus_ai=debug,campus=debug,warn"
    } else {
        "campus_ai=warn,campus=warn,error"
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides `--verbose`.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init();
}

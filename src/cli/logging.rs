/// Logging setup: `tracing` events to stderr, filtered by `RUST_LOG` or CLI flags.
use tracing_subscriber::EnvFilter;

/// Pick the default filter directive for the CLI verbosity flags.
#[must_use]
pub fn default_directive(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "mastr_fetch=trace"
    } else if verbose {
        "mastr_fetch=debug"
    } else {
        "mastr_fetch=info"
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the flags.
///
/// Stdout stays reserved for records, so all log output goes to stderr.
pub fn init(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

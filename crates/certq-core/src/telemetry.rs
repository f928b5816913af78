//! Log output for the `certq` binary.
//!
//! Filter directives come from `CERTQ_LOG`, then `RUST_LOG`, then the
//! level picked on the command line. Output goes to stderr; stdout carries
//! queue tables and JSON.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var read before `RUST_LOG`.
pub const LOG_ENV: &str = "CERTQ_LOG";

/// Pick the filter directive. Blank variables are ignored.
fn filter_directive(certq_log: Option<String>, rust_log: Option<String>, level: Level) -> String {
    [certq_log, rust_log]
        .into_iter()
        .flatten()
        .map(|d| d.trim().to_string())
        .find(|d| !d.is_empty())
        .unwrap_or_else(|| level.as_str().to_ascii_lowercase())
}

fn env_filter(level: Level) -> EnvFilter {
    let directive = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        level,
    );
    EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("certq: ignoring log filter {directive:?}: {err}");
        EnvFilter::new(level.as_str())
    })
}

/// Install the global subscriber; `json` switches to newline-delimited JSON.
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = env_filter(level);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
}

//! Log output for the chronofill binary.
//!
//! Logs always go to stderr. Stdout carries only the run summary (plain text,
//! or JSON with `--json`), so `chronofill prs --json > summary.json` keeps
//! the summary clean while progress stays visible.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `level` when it holds a valid filter. With `json`
/// every event is one JSON object per line, carrying the `chronofill.run`
/// span fields. A second call is a no-op.
pub fn init_tracing(json: bool, level: Level) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, rust_log.as_deref());

    let output: Box<dyn Layer<Registry> + Send + Sync> = if json {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .ok();
}

/// Filter from `RUST_LOG` if it parses, else from the verbosity flag.
fn log_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

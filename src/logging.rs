//! Tracing subscriber setup for the command line tool

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default level for a `-v` count
pub fn level_for(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Build a stderr subscriber
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`.
pub fn build_subscriber(verbosity: u8) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_for(verbosity).into()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbosity: u8) {
    let _ = build_subscriber(verbosity).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), tracing::Level::WARN);
        assert_eq!(level_for(1), tracing::Level::INFO);
        assert_eq!(level_for(2), tracing::Level::DEBUG);
        assert_eq!(level_for(9), tracing::Level::TRACE);
    }

    #[test]
    fn test_subscriber_can_be_scoped() {
        let subscriber = build_subscriber(2);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("scoped debug event");
        });
    }
}

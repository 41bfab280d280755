//! stderr log subscriber.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over `-v` when set.
pub(crate) fn init(verbose: u8, default_level: LevelFilter) {
    let requested = match verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let level = default_level.max(requested);

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // A second init (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

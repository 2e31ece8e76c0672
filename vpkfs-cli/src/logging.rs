//! Log output setup.
//!
//! `RUST_LOG` wins when set; otherwise `-v` flags raise the library level
//! from `info` to `debug` to `trace`. Logs go to stderr so `cat` output stays
//! clean.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for a verbosity count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "vpkfs=info",
        1 => "vpkfs=debug",
        _ => "vpkfs=trace",
    }
}

/// Install the global subscriber.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .compact()
        .init();
}

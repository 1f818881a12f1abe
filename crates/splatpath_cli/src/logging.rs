// SPDX-License-Identifier: MIT OR Apache-2.0
//! Log subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset, by `--verbose` count
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "splatpath=info",
        1 => "splatpath=debug",
        _ => "splatpath=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "splatpath=info");
        assert_eq!(default_directive(1), "splatpath=debug");
        assert_eq!(default_directive(5), "splatpath=trace");
    }
}

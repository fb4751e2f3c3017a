//! Subscriber setup for the engine and the `choice-engine` binary.
//!
//! Logs always go to stderr: the binary prints rankings and events as JSON on
//! stdout, and the two streams must not interleave.

use clap::ValueEnum;
use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human-readable records.
    #[default]
    Compact,
    /// One JSON object per record, for log collectors.
    Json,
}

/// Whether we run under `cargo test` / nextest.
fn under_test_harness() -> bool {
    std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok()
}

/// Directive used when `RUST_LOG` is unset: keystroke-level detail under
/// tests, lifecycle events otherwise.
fn default_level(under_test: bool) -> LevelFilter {
    if under_test {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let under_test = under_test_harness();
        let filter = EnvFilter::builder()
            .with_default_directive(default_level(under_test).into())
            .from_env_lossy();

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true);

        let result = match format {
            LogFormat::Json => builder.json().with_writer(std::io::stderr).try_init(),
            LogFormat::Compact if under_test => builder.compact().with_test_writer().try_init(),
            LogFormat::Compact => builder.compact().with_writer(std::io::stderr).try_init(),
        };

        if let Err(e) = result {
            eprintln!("Tracing subscriber already installed: {}", e);
        }
    });
}

//! Diagnostic tracing.
//!
//! Two channels exist and stay separate:
//!
//! - **Diagnostics (this module)**: state transitions and swallowed
//!   browser-control errors, filtered by `RUST_LOG`, written to stderr.
//! - **Outcomes ([`Reporter`](crate::Reporter))**: one `True`/`False`
//!   message per assertion, unaffected by `RUST_LOG` unless the reporter
//!   itself forwards to `tracing`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Install a compact stderr subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed, in which case
/// nothing changes.
///
/// ```bash
/// RUST_LOG=stepcheck=debug cargo test
/// ```
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Like [`init`], with a different fallback filter
pub fn init_with_default(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .is_ok()
}

//! Development helper: tracing subscriber setup for tests and tools.

/// Initialize a tracing subscriber when `RUST_LOG` is set.
///
/// Tests and small tools can call `viewcast::dev_tracing::init_tracing()`
/// to see the producer/consumer logs while debugging. This is a no-op when
/// `RUST_LOG` is not set or when a global subscriber is already installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

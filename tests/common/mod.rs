#![allow(dead_code)]

use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Scoped `tracing` subscriber for a test; events go through the test writer
/// so they only show for failing tests.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = Registry::default()
            .with(EnvFilter::new("acprouter=debug"))
            .with(tracing_subscriber::fmt::layer().with_test_writer());
        let guard = tracing::subscriber::set_default(subscriber);
        Self { _guard: guard }
    }
}

/// Coroutine stack size for tests that spawn `may` coroutines
pub fn set_stack_size() {
    let size = std::env::var("ACP_STACK_SIZE")
        .ok()
        .and_then(|v| {
            if let Some(hex) = v.strip_prefix("0x") {
                usize::from_str_radix(hex, 16).ok()
            } else {
                v.parse().ok()
            }
        })
        .unwrap_or(0x8000);
    may::config().set_stack_size(size);
}

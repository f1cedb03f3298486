//! Process-wide default collector for code that cannot have one passed in.

use std::sync::{Arc, OnceLock};

use errata_core::Collector;

static COLLECTOR: OnceLock<Arc<Collector>> = OnceLock::new();

/// The shared collector, created with default config on first use.
pub fn collector() -> Arc<Collector> {
    COLLECTOR.get_or_init(|| Arc::new(Collector::new())).clone()
}

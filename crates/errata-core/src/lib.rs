pub mod collector;
pub mod config;
pub mod describe;
pub mod error;
pub mod http_context;
pub mod key;
pub mod report;
pub mod snapshot;
pub mod stack;
pub mod types;

pub use collector::Collector;
pub use config::CollectorConfig;
pub use describe::{DefaultDescriber, Describe, Description};
pub use error::{Error, Result};
pub use key::{derive_key, KeyStrategy};
pub use report::ErrorReport;
pub use snapshot::{AggregatedErrorView, SnapshotPayload};
pub use types::*;

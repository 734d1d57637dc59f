//! In-memory cache and refresh coordination for hemisphere extent records.

pub mod cache;
pub mod refresh;

pub use cache::{CacheSnapshot, ExtentCache};
pub use refresh::{ExtentSource, RefreshCoordinator, RefreshOutcome};

//! In-memory cache for classified hemisphere records.
//!
//! Uses `DashMap` for the per-hemisphere slots — readers clone values out
//! and are never blocked by an in-flight refresh.

use chrono::{DateTime, Utc};
use common::{Hemisphere, HemisphereStatus};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Authoritative cache state.
///
/// Each hemisphere slot is replaced wholesale on a successful fetch, so a
/// reader never observes a record mixing two refresh cycles. The generation
/// counter advances once per completed refresh cycle and lets concurrent
/// refresh callers detect that the work was already done while they waited.
#[derive(Debug, Default)]
pub struct ExtentCache {
    slots: DashMap<Hemisphere, HemisphereStatus>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    generation: AtomicU64,
}

/// Point-in-time copy of the whole cache, as served by `/api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub north: Option<HemisphereStatus>,
    pub south: Option<HemisphereStatus>,
    pub last_refresh: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl CacheSnapshot {
    /// True when no hemisphere has ever been fetched.
    pub fn is_empty(&self) -> bool {
        self.north.is_none() && self.south.is_none()
    }
}

impl ExtentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a hemisphere, if one has been fetched.
    pub fn get(&self, hemisphere: Hemisphere) -> Option<HemisphereStatus> {
        self.slots.get(&hemisphere).map(|entry| entry.value().clone())
    }

    /// Replace a hemisphere's record in one step.
    pub(crate) fn store(&self, status: HemisphereStatus) {
        self.slots.insert(status.hemisphere, status);
    }

    /// Timestamp of the last refresh cycle that updated at least one slot.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.read().await
    }

    /// Failure summary from the most recent refresh cycle, if any fetch failed.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub(crate) async fn record_refresh(&self, at: DateTime<Utc>) {
        *self.last_refresh.write().await = Some(at);
    }

    pub(crate) async fn set_last_error(&self, error: Option<String>) {
        *self.last_error.write().await = error;
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Copy of everything a status endpoint needs.
    pub async fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            north: self.get(Hemisphere::North),
            south: self.get(Hemisphere::South),
            last_refresh: self.last_refresh().await,
            last_error: self.last_error().await,
        }
    }
}

//! Single-flight refresh coordination.
//!
//! At most one refresh cycle runs at a time. Callers that arrive while a
//! cycle is in flight wait for it and reuse its result instead of issuing
//! a second round of upstream fetches.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use common::{Hemisphere, HemisphereStatus, Result};
use nsidc_client::NsidcClient;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::ExtentCache;

/// Source of classified hemisphere records.
///
/// Implemented by the sea-ice index client; test doubles script failures
/// and delays.
pub trait ExtentSource: Send + Sync + 'static {
    /// Fetch and classify the current record for one hemisphere.
    fn fetch_status(
        &self,
        hemisphere: Hemisphere,
    ) -> impl Future<Output = Result<HemisphereStatus>> + Send;
}

impl ExtentSource for NsidcClient {
    fn fetch_status(
        &self,
        hemisphere: Hemisphere,
    ) -> impl Future<Output = Result<HemisphereStatus>> + Send {
        NsidcClient::fetch_status(self, hemisphere)
    }
}

/// Outcome of a `refresh_all` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This caller ran the cycle.
    Completed { succeeded: usize, failed: usize },
    /// Another caller's cycle finished while we waited; its result stands.
    Coalesced,
}

/// Owns the refresh critical section between the upstream source and the
/// cache. The cache lock is never held across an upstream await; each slot
/// is replaced wholesale only after its fetch succeeds.
pub struct RefreshCoordinator<S: ExtentSource> {
    cache: Arc<ExtentCache>,
    source: S,
    refresh_lock: Mutex<()>,
}

impl<S: ExtentSource> RefreshCoordinator<S> {
    pub fn new(cache: Arc<ExtentCache>, source: S) -> Self {
        Self {
            cache,
            source,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<ExtentCache> {
        &self.cache
    }

    /// Refresh both hemispheres, coalescing with any cycle already in flight.
    ///
    /// A failure on one hemisphere records the error and leaves that slot
    /// untouched; the other hemisphere still updates.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        let seen = self.cache.generation();
        let _guard = self.refresh_lock.lock().await;

        // A cycle that completed while we waited for the lock already did
        // the work.
        if self.cache.generation() != seen {
            return RefreshOutcome::Coalesced;
        }

        self.run_cycle().await
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        let started = Utc::now();
        let mut succeeded = 0usize;
        let mut failures: Vec<String> = Vec::new();

        for hemisphere in Hemisphere::ALL {
            match self.refresh_slot(hemisphere).await {
                Ok(readings) => {
                    info!("Refreshed {} extent record ({} readings)", hemisphere, readings);
                    succeeded += 1;
                }
                Err(e) => {
                    warn!("Refresh failed for {}: {} (keeping stale data)", hemisphere, e);
                    failures.push(format!("{}: {}", hemisphere, e));
                }
            }
        }

        if succeeded > 0 {
            self.cache.record_refresh(started).await;
        }
        let failed = failures.len();
        self.cache
            .set_last_error(if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            })
            .await;
        self.cache.bump_generation();

        RefreshOutcome::Completed { succeeded, failed }
    }

    /// Refresh a single hemisphere under the same single-flight lock.
    ///
    /// Does not advance the refresh generation: only a full cycle counts
    /// for coalescing `refresh_all` callers.
    pub async fn refresh_one(&self, hemisphere: Hemisphere) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        match self.refresh_slot(hemisphere).await {
            Ok(readings) => {
                info!("Refreshed {} extent record ({} readings)", hemisphere, readings);
                self.cache.record_refresh(Utc::now()).await;
                Ok(())
            }
            Err(e) => {
                warn!("Refresh failed for {}: {} (keeping stale data)", hemisphere, e);
                self.cache
                    .set_last_error(Some(format!("{}: {}", hemisphere, e)))
                    .await;
                Err(e)
            }
        }
    }

    /// Fetch one hemisphere and replace its slot. Returns the record length
    /// for logging.
    async fn refresh_slot(&self, hemisphere: Hemisphere) -> Result<usize> {
        let status = self.source.fetch_status(hemisphere).await?;
        let readings = status.historical.len();
        self.cache.store(status);
        Ok(readings)
    }
}

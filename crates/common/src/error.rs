//! Unified error type for the ice-extent service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed upstream payload: {0}")]
    MalformedUpstreamData(String),

    #[error("invalid hemisphere {0:?} (expected \"north\" or \"south\")")]
    InvalidHemisphere(String),

    #[error("no data fetched from the sea-ice index yet")]
    NotYetCached,

    #[error("refresh did not complete within {0} seconds")]
    RefreshTimeout(u64),

    #[error("config error: {0}")]
    Config(String),
}

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

/// Outcome of a cache-backed operation.
///
/// `success = true` with `data = None` is the "not ready yet" signal: either nothing is
/// cached or another holder of the lease is doing the work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct CacheResponse {
    pub success: bool,
    pub data: Option<String>,
}

impl CacheResponse {
    pub fn ready(data: impl Into<String>) -> Self {
        Self { success: true, data: Some(data.into()) }
    }

    pub fn pending() -> Self {
        Self { success: true, data: None }
    }

    pub fn failed() -> Self {
        Self { success: false, data: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct InitializeOutcome {
    pub success: bool,
    pub data: Option<String>,
    pub scan_summary: Option<String>,
}

impl InitializeOutcome {
    pub fn failed() -> Self {
        Self::default()
    }
}

impl From<CacheResponse> for InitializeOutcome {
    fn from(resp: CacheResponse) -> Self {
        Self {
            success: resp.success,
            scan_summary: resp.data.clone(),
            data: resp.data,
        }
    }
}

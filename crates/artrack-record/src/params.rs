use serde::{Deserialize, Serialize};

/// Seconds without a detection after which a marker is forgotten.
pub const STALE_TIMEOUT: f64 = 2.0;

/// Minimum seconds between two stale scans.
pub const EVICTION_INTERVAL: f64 = 1.0;

fn default_stale_timeout() -> f64 {
    STALE_TIMEOUT
}

fn default_eviction_interval() -> f64 {
    EVICTION_INTERVAL
}

fn default_protect_session_history() -> bool {
    true
}

/// Marker lifecycle settings for [`crate::Tracker`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerParams {
    #[serde(default = "default_stale_timeout")]
    pub stale_timeout: f64,
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval: f64,
    /// Keep stale markers that still hold history of the current session,
    /// so a marker leaving the view does not drop recorded data.
    #[serde(default = "default_protect_session_history")]
    pub protect_session_history: bool,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            stale_timeout: STALE_TIMEOUT,
            eviction_interval: EVICTION_INTERVAL,
            protect_session_history: true,
        }
    }
}

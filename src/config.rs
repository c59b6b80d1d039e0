//! Scan schedule
//!
//! The site loads in stages and routes client-side, so the scanner re-runs
//! on a fixed back-off after activation and after every URL change. The
//! defaults below are the tuned values; any field can be overridden from
//! JSON, missing fields keep their default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Id of the injected `<style>` element, also the double-injection marker
pub const STYLE_ELEMENT_ID: &str = "espn-dark-mode";

/// Tabs the popup broadcasts toggle messages to
pub const HOST_TAB_PATTERN: &str = "*://*.espn.com/*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSchedule {
    /// Full-page re-sweeps after activation (ms)
    pub initial_delays_ms: Vec<u32>,
    /// Period of the follow-up full sweeps
    pub periodic_interval_ms: u32,
    /// Number of periodic sweeps before steady state is assumed
    pub periodic_ticks: u32,
    /// Second sweep of a freshly inserted subtree
    pub inserted_followup_ms: u32,
    /// Attribute changes re-sweep the subtree only below this many children
    pub attribute_subtree_limit: usize,
    /// How often the URL is compared for client-side navigation
    pub navigation_poll_ms: u32,
    /// Full-page re-sweeps after a URL change (ms)
    pub navigation_delays_ms: Vec<u32>,
}

impl Default for ScanSchedule {
    fn default() -> Self {
        Self {
            initial_delays_ms: vec![50, 150, 300, 500, 800, 1200, 1800, 2500, 3500, 5000, 8000],
            periodic_interval_ms: 2000,
            periodic_ticks: 15,
            inserted_followup_ms: 100,
            attribute_subtree_limit: 100,
            navigation_poll_ms: 500,
            navigation_delays_ms: vec![0, 200, 500, 1000, 2000, 4000],
        }
    }
}

impl ScanSchedule {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let schedule: Self = serde_json::from_str(json)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject values that would turn a timer into a busy loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periodic_ticks > 0 && self.periodic_interval_ms == 0 {
            return Err(ConfigError::Invalid("periodic_interval_ms must be positive"));
        }
        if self.navigation_poll_ms == 0 {
            return Err(ConfigError::Invalid("navigation_poll_ms must be positive"));
        }
        Ok(())
    }

    /// Time after activation at which the last scheduled full sweep runs
    pub fn settle_time_ms(&self) -> u64 {
        let initial = self.initial_delays_ms.iter().copied().max().unwrap_or(0) as u64;
        let periodic = self.periodic_interval_ms as u64 * self.periodic_ticks as u64;
        initial.max(periodic)
    }
}

//! Enabled flag and toggle messages
//!
//! The flag lives in extension sync storage as `{ "enabled": bool }` and
//! defaults to enabled. The popup flips it and sends
//! `{ "action": "toggle", "enabled": bool }` to every open ESPN tab.

use crate::error::MessageError;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn enabled_by_default() -> bool {
    true
}

/// Persisted extension settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Popup status line
    pub fn status_label(&self) -> &'static str {
        if self.enabled {
            "Active"
        } else {
            "Disabled"
        }
    }
}

/// Messages delivered to the content script through the runtime channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RuntimeMessage {
    Toggle { enabled: bool },
    /// Any other action; ignored
    #[serde(other)]
    Other,
}

impl RuntimeMessage {
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> String {
        // Plain enum of bools, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Storage backing the enabled flag
pub trait FlagStore {
    /// `None` when nothing has been written yet
    fn load(&self) -> Option<Settings>;
    fn save(&mut self, settings: Settings);
}

/// Flag read at page load, defaulting to enabled
pub fn read_enabled_flag<S: FlagStore + ?Sized>(store: &S) -> bool {
    store.load().unwrap_or_default().enabled
}

/// Install hook: make sure the key exists, keeping any earlier choice
pub fn on_installed<S: FlagStore + ?Sized>(store: &mut S) -> Settings {
    let settings = store.load().unwrap_or_default();
    store.save(settings);
    debug!(enabled = settings.enabled, "Install defaults written");
    settings
}

/// Popup toggle: persist the new flag and build the broadcast message
pub fn set_enabled<S: FlagStore + ?Sized>(store: &mut S, enabled: bool) -> RuntimeMessage {
    store.save(Settings { enabled });
    RuntimeMessage::Toggle { enabled }
}

/// Flag store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Option<Settings>,
    writes: usize,
}

impl MemoryStore {
    pub fn with(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl FlagStore for MemoryStore {
    fn load(&self) -> Option<Settings> {
        self.settings
    }

    fn save(&mut self, settings: Settings) {
        self.settings = Some(settings);
        self.writes += 1;
    }
}

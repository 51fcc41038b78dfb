//! In-memory configuration store for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::config::{AppConfig, ConfigError};
use crate::application::settings::ConfigStore;

#[derive(Default)]
struct State {
    saved: Vec<AppConfig>,
    fail: bool,
}

/// A [`ConfigStore`] that records every save.  Clones share state.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    state: Arc<Mutex<State>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every save fails with [`ConfigError::NoPlatformConfigDir`].
    pub fn failing() -> Self {
        let store = Self::default();
        store.state.lock().fail = true;
        store
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saved.len()
    }

    pub fn last_saved(&self) -> Option<AppConfig> {
        self.state.lock().saved.last().cloned()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(ConfigError::NoPlatformConfigDir);
        }
        state.saved.push(config.clone());
        Ok(())
    }
}

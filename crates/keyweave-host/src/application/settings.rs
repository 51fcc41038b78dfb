//! ImeController: applies user settings to the engine and the hook filter.
//!
//! This is the settings collaborator of the pipeline.  It owns the loaded
//! [`AppConfig`], pushes it into the engine at startup, and handles the
//! changes that happen at runtime: the toggle hotkey, switching the typing
//! method, editing abbreviations and recording a new hotkey.  Every change
//! that outlives the process is written back through a [`ConfigStore`].
//!
//! All engine calls go through [`SharedEngine`], so they are serialized with
//! the worker's key processing.

use std::sync::Arc;

use keyweave_core::{InputMethod, KeyboardShortcut, SharedEngine};
use tracing::{debug, info};

use super::filter_keys::{HookNotice, KeyFilter};
use crate::infrastructure::storage::config::{AppConfig, ConfigError};

/// Where changed settings are persisted.
pub trait ConfigStore: Send {
    fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;
}

pub struct ImeController {
    engine: SharedEngine,
    filter: Arc<KeyFilter>,
    config: AppConfig,
    store: Box<dyn ConfigStore>,
}

impl ImeController {
    pub fn new(
        engine: SharedEngine,
        filter: Arc<KeyFilter>,
        config: AppConfig,
        store: Box<dyn ConfigStore>,
    ) -> Self {
        Self { engine, filter, config, store }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    /// Initializes the engine and applies the whole configuration.
    ///
    /// Call once before the pipeline starts.
    pub fn apply_all(&self) {
        let engine = &self.config.engine;
        self.engine.initialize();
        self.engine.set_method(engine.method);
        self.engine.set_enabled(engine.enabled);
        self.engine.set_modern_tone(engine.modern_tone);
        self.engine.set_skip_w_shortcut(engine.skip_w_shortcut);
        self.engine.set_esc_restore(engine.esc_restore);
        self.engine.set_free_tone(engine.free_tone);
        self.engine.set_english_auto_restore(engine.english_auto_restore);
        self.engine.set_auto_capitalize(engine.auto_capitalize);

        self.engine.clear_shortcuts();
        for (trigger, replacement) in &self.config.shortcuts {
            self.engine.add_shortcut(trigger, replacement);
        }

        self.filter.set_hotkey(Some(self.config.hotkey.toggle));
        self.filter.set_hotkey_enabled(self.config.hotkey.enabled);

        info!(
            method = %engine.method,
            enabled = engine.enabled,
            shortcuts = self.config.shortcuts.len(),
            hotkey = %self.config.hotkey.toggle,
            "settings applied"
        );
    }

    /// Reacts to a notification from the hook thread.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting change could not be persisted.
    /// The change itself has already taken effect.
    pub fn handle_notice(&mut self, notice: HookNotice) -> Result<(), ConfigError> {
        match notice {
            HookNotice::HotkeyTriggered => self.toggle_enabled().map(|_| ()),
        }
    }

    /// Flips transformation on or off and persists the new state.
    ///
    /// Returns the new state.
    pub fn toggle_enabled(&mut self) -> Result<bool, ConfigError> {
        let enabled = !self.engine.is_enabled();
        self.set_enabled(enabled)?;
        Ok(enabled)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.engine.set_enabled(enabled);
        self.config.engine.enabled = enabled;
        info!(enabled, "transformation toggled");
        self.persist()
    }

    pub fn set_method(&mut self, method: InputMethod) -> Result<(), ConfigError> {
        self.engine.set_method(method);
        self.config.engine.method = method;
        info!(%method, "input method changed");
        self.persist()
    }

    /// Replaces the toggle hotkey and re-arms matching.
    pub fn set_hotkey(&mut self, hotkey: KeyboardShortcut) -> Result<(), ConfigError> {
        self.filter.set_hotkey(Some(hotkey));
        self.filter.set_hotkey_enabled(true);
        self.config.hotkey.toggle = hotkey;
        self.config.hotkey.enabled = true;
        info!(%hotkey, "toggle hotkey changed");
        self.persist()
    }

    /// Suspends hotkey matching while the user records a new combination.
    pub fn begin_hotkey_recording(&self) {
        debug!("hotkey recording started");
        self.filter.set_hotkey_enabled(false);
    }

    /// Ends recording without a change; the previous hotkey is armed again.
    pub fn cancel_hotkey_recording(&self) {
        debug!("hotkey recording cancelled");
        self.filter.set_hotkey_enabled(self.config.hotkey.enabled);
    }

    pub fn add_shortcut(&mut self, trigger: &str, replacement: &str) -> Result<(), ConfigError> {
        self.engine.add_shortcut(trigger, replacement);
        self.config.shortcuts.insert(trigger.to_string(), replacement.to_string());
        self.persist()
    }

    pub fn remove_shortcut(&mut self, trigger: &str) -> Result<(), ConfigError> {
        self.engine.remove_shortcut(trigger);
        self.config.shortcuts.remove(trigger);
        self.persist()
    }

    fn persist(&self) -> Result<(), ConfigError> {
        self.store.save(&self.config)
    }
}

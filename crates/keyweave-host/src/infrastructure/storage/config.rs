//! TOML-based configuration persistence.
//!
//! Reads and writes [`AppConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\Keyweave\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/keyweave/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/Keyweave/config.toml`
//!
//! ```toml
//! [engine]
//! method = "vni"
//! modern_tone = true
//!
//! [hotkey]
//! toggle = "Ctrl+Shift+Z"
//!
//! [injection]
//! slow_apps = ["code", "chrome", "windowsterminal"]
//! clipboard_apps = ["mintty"]
//!
//! [shortcuts]
//! vn = "Việt Nam"
//! ```
//!
//! Every field carries a serde default, so a missing file, a missing section
//! or a file written by an older build all load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use keyweave_core::{InputMethod, KeyboardShortcut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::classify_app::{ClassificationRules, DEFAULT_SLOW_APPS};
use crate::application::inject_text::InjectionTiming;
use crate::application::settings::ConfigStore;
use crate::application::worker::WorkerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
    /// Text abbreviations, `trigger = "replacement"`.
    #[serde(default)]
    pub shortcuts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Cleared once first-run defaults have been written.
    #[serde(default = "default_true")]
    pub first_run: bool,
}

/// Engine feature flags, applied at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub method: InputMethod,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub modern_tone: bool,
    #[serde(default)]
    pub skip_w_shortcut: bool,
    #[serde(default = "default_true")]
    pub esc_restore: bool,
    #[serde(default)]
    pub free_tone: bool,
    #[serde(default)]
    pub english_auto_restore: bool,
    #[serde(default = "default_true")]
    pub auto_capitalize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotkeyConfig {
    /// `"Ctrl+Space"` style, or the legacy `"<keycode>,<modifiers>"` form.
    #[serde(default)]
    pub toggle: KeyboardShortcut,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectionConfig {
    #[serde(default = "default_fast_delay_ms")]
    pub fast_delay_ms: u64,
    #[serde(default = "default_slow_pre_delay_ms")]
    pub slow_pre_delay_ms: u64,
    #[serde(default = "default_slow_post_delay_ms")]
    pub slow_post_delay_ms: u64,
    #[serde(default = "default_slow_key_delay_ms")]
    pub slow_key_delay_ms: u64,
    #[serde(default = "default_clipboard_restore_delay_ms")]
    pub clipboard_restore_delay_ms: u64,
    /// Process identities that receive paced injection.
    #[serde(default = "default_slow_apps")]
    pub slow_apps: Vec<String>,
    /// Process identities that receive clipboard-paste injection.
    #[serde(default)]
    pub clipboard_apps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSettings {
    #[serde(default = "default_dequeue_timeout_ms")]
    pub dequeue_timeout_ms: u64,
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_fast_delay_ms() -> u64 {
    2
}
fn default_slow_pre_delay_ms() -> u64 {
    5
}
fn default_slow_post_delay_ms() -> u64 {
    3
}
fn default_slow_key_delay_ms() -> u64 {
    1
}
fn default_clipboard_restore_delay_ms() -> u64 {
    50
}
fn default_slow_apps() -> Vec<String> {
    DEFAULT_SLOW_APPS.iter().map(|s| s.to_string()).collect()
}
fn default_dequeue_timeout_ms() -> u64 {
    1
}
fn default_stop_timeout_ms() -> u64 {
    1000
}
fn default_queue_capacity() -> usize {
    keyweave_core::queue::DEFAULT_CAPACITY
}

/// Abbreviations written into the config on first run.
pub const DEFAULT_SHORTCUTS: &[(&str, &str)] = &[
    ("vn", "Việt Nam"),
    ("hn", "Hà Nội"),
    ("hcm", "Hồ Chí Minh"),
    ("tphcm", "Thành phố Hồ Chí Minh"),
    ("ko", "không"),
    ("kg", "không"),
    ("k", "không"),
    ("dc", "được"),
    ("vs", "với"),
    ("ms", "mới"),
];

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: default_log_level(), first_run: true }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            method: InputMethod::default(),
            enabled: true,
            modern_tone: true,
            skip_w_shortcut: false,
            esc_restore: true,
            free_tone: false,
            english_auto_restore: false,
            auto_capitalize: true,
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self { toggle: KeyboardShortcut::default(), enabled: true }
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            fast_delay_ms: default_fast_delay_ms(),
            slow_pre_delay_ms: default_slow_pre_delay_ms(),
            slow_post_delay_ms: default_slow_post_delay_ms(),
            slow_key_delay_ms: default_slow_key_delay_ms(),
            clipboard_restore_delay_ms: default_clipboard_restore_delay_ms(),
            slow_apps: default_slow_apps(),
            clipboard_apps: Vec::new(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            dequeue_timeout_ms: default_dequeue_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ── Conversions into runtime types ────────────────────────────────────────────

impl InjectionConfig {
    pub fn timing(&self) -> InjectionTiming {
        InjectionTiming {
            fast_delay: Duration::from_millis(self.fast_delay_ms),
            slow_post_delay: Duration::from_millis(self.slow_post_delay_ms),
            slow_pre_delay: Duration::from_millis(self.slow_pre_delay_ms),
            slow_key_delay: Duration::from_millis(self.slow_key_delay_ms),
            clipboard_restore_delay: Duration::from_millis(self.clipboard_restore_delay_ms),
        }
    }

    pub fn rules(&self) -> ClassificationRules {
        ClassificationRules::new(&self.slow_apps, &self.clipboard_apps)
    }

    /// `true` when any identity is routed to the clipboard strategy.
    pub fn uses_clipboard(&self) -> bool {
        !self.clipboard_apps.is_empty()
    }
}

impl WorkerSettings {
    /// Timings for the worker.  The dequeue timeout is at least 1 ms; zero
    /// would turn the worker loop into a busy spin.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            dequeue_timeout: Duration::from_millis(self.dequeue_timeout_ms.max(1)),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }

    /// Capacity with a floor of 1; a zero-capacity queue would drop every key.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl AppConfig {
    /// Inserts the default abbreviations and clears `first_run`.
    ///
    /// Returns `true` if anything changed and the config should be saved.
    pub fn apply_first_run_defaults(&mut self) -> bool {
        if !self.general.first_run {
            return false;
        }
        for (trigger, replacement) in DEFAULT_SHORTCUTS {
            self.shortcuts
                .entry((*trigger).to_string())
                .or_insert_with(|| (*replacement).to_string());
        }
        self.general.first_run = false;
        true
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform location, returning defaults if the
/// file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; see [`load_config`].
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path: path.to_path_buf(), source: e }),
    }
}

/// Persists `config` to the platform location, creating the directory if
/// needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Persists `config` to `path`; see [`save_config`].
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// [`ConfigStore`] writing to a fixed file path.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`config_file_path`].
    pub fn at_platform_path() -> Result<Self, ConfigError> {
        Ok(Self::new(config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        load_config_from(&self.path)
    }
}

impl ConfigStore for FileConfigStore {
    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        save_config_to(&self.path, config)
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Keyweave"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyweave"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h).join("Library").join("Application Support").join("Keyweave")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! ClassifyAppUseCase: picks the injection strategy for the focused window.
//!
//! Web-rendering editors, terminals and browsers drop or reorder characters
//! when a replacement arrives as one burst, so they get the paced Slow
//! strategy.  Identities listed as clipboard apps get the paste strategy.
//! Everything else, including every lookup failure, is Fast.
//!
//! The process lookup is the expensive part.  The last classification is kept
//! per window handle and reused until the foreground window changes.

use std::collections::HashSet;

use keyweave_core::{InjectionClassification, InjectionStrategy, WindowHandle};
use tracing::{debug, trace};

/// Process identities classified Slow out of the box.
pub const DEFAULT_SLOW_APPS: &[&str] = &[
    // Chromium/Electron editors and chat clients
    "claude",
    "notion",
    "slack",
    "discord",
    "teams",
    "code",
    "vscode",
    "cursor",
    "obsidian",
    "figma",
    // Terminals
    "windowsterminal",
    "cmd",
    "powershell",
    "pwsh",
    "wezterm",
    "alacritty",
    "hyper",
    "mintty",
    "wave",
    "waveterm",
    // Browsers
    "chrome",
    "msedge",
    "firefox",
    "brave",
    "opera",
    "vivaldi",
    "arc",
];

/// OS queries needed to classify the foreground application.
#[cfg_attr(test, mockall::automock)]
pub trait ForegroundQuery: Send {
    /// The window that currently has input focus; [`WindowHandle::NULL`] if none.
    fn foreground_window(&self) -> WindowHandle;

    /// Identity of the process owning `window`, or `None` if it cannot be
    /// determined (exited, access denied).
    fn process_identity(&self, window: WindowHandle) -> Option<String>;
}

/// Reduces an executable path or name to its identity: the lower-cased file
/// stem.  `C:\Program Files\Foo\Code.exe` becomes `code`.
pub fn normalize_identity(image: &str) -> String {
    let file = image.rsplit(['\\', '/']).next().unwrap_or(image);
    let lower = file.to_ascii_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Identity → strategy membership sets.  Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ClassificationRules {
    slow: HashSet<String>,
    clipboard: HashSet<String>,
}

impl ClassificationRules {
    pub fn new<S, C>(slow: S, clipboard: C) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            slow: slow.into_iter().map(|s| normalize_identity(s.as_ref())).collect(),
            clipboard: clipboard.into_iter().map(|s| normalize_identity(s.as_ref())).collect(),
        }
    }

    /// Clipboard membership wins over Slow.
    pub fn strategy_for(&self, identity: &str) -> InjectionStrategy {
        let identity = normalize_identity(identity);
        if self.clipboard.contains(&identity) {
            InjectionStrategy::Clipboard
        } else if self.slow.contains(&identity) {
            InjectionStrategy::Slow
        } else {
            InjectionStrategy::Fast
        }
    }

    /// [`DEFAULT_SLOW_APPS`] and no clipboard apps.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SLOW_APPS.iter().copied(), std::iter::empty::<&str>())
    }
}

/// Foreground classifier with a one-entry cache.
///
/// Owned by the worker thread; nothing else reads or writes the cache.
pub struct AppClassifier<P: ForegroundQuery> {
    foreground: P,
    rules: ClassificationRules,
    cached: Option<InjectionClassification>,
}

impl<P: ForegroundQuery> AppClassifier<P> {
    pub fn new(foreground: P, rules: ClassificationRules) -> Self {
        Self { foreground, rules, cached: None }
    }

    /// Strategy for the window that has focus right now.
    pub fn classify(&mut self) -> InjectionStrategy {
        let window = self.foreground.foreground_window();
        if let Some(hit) = self.cached.as_ref().filter(|c| c.window == window) {
            return hit.strategy;
        }

        let identity = if window.is_null() {
            None
        } else {
            self.foreground.process_identity(window)
        };

        match identity {
            Some(identity) => {
                let identity = normalize_identity(&identity);
                let strategy = self.rules.strategy_for(&identity);
                trace!(window = window.0, %identity, ?strategy, "classified foreground window");
                self.cached = Some(InjectionClassification {
                    window,
                    process_identity: identity,
                    strategy,
                });
                strategy
            }
            None => {
                debug!(window = window.0, "foreground process lookup failed; using Fast");
                self.cached = None;
                InjectionStrategy::Fast
            }
        }
    }

    /// Drops the cached classification.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Identity of the cached foreground process, for diagnostics.
    pub fn current_identity(&self) -> Option<&str> {
        self.cached.as_ref().map(|c| c.process_identity.as_str())
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: ClassificationRules) {
        self.rules = rules;
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use mockall::Sequence;

    use super::*;

    const EDITOR: WindowHandle = WindowHandle(0x100);
    const TERMINAL: WindowHandle = WindowHandle(0x200);

    #[test]
    fn test_normalize_identity_strips_path_and_extension() {
        assert_eq!(normalize_identity(r"C:\Program Files\Microsoft VS Code\Code.exe"), "code");
        assert_eq!(normalize_identity("WindowsTerminal.EXE"), "windowsterminal");
        assert_eq!(normalize_identity("/usr/bin/alacritty"), "alacritty");
        assert_eq!(normalize_identity("notepad"), "notepad");
    }

    #[test]
    fn test_default_rules_classify_known_apps() {
        let rules = ClassificationRules::with_defaults();

        assert_eq!(rules.strategy_for("Code"), InjectionStrategy::Slow);
        assert_eq!(rules.strategy_for("chrome.exe"), InjectionStrategy::Slow);
        assert_eq!(rules.strategy_for("pwsh"), InjectionStrategy::Slow);
        assert_eq!(rules.strategy_for("notepad"), InjectionStrategy::Fast);
        assert_eq!(rules.strategy_for("winword"), InjectionStrategy::Fast);
    }

    #[test]
    fn test_clipboard_membership_wins_over_slow() {
        let rules = ClassificationRules::new(["mintty"], ["mintty"]);

        assert_eq!(rules.strategy_for("mintty"), InjectionStrategy::Clipboard);
    }

    #[test]
    fn test_same_window_reuses_cached_lookup() {
        // Arrange
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().times(3).return_const(EDITOR);
        foreground
            .expect_process_identity()
            .with(eq(EDITOR))
            .times(1)
            .returning(|_| Some("Code.exe".to_string()));
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        // Act
        let strategies: Vec<_> = (0..3).map(|_| classifier.classify()).collect();

        // Assert
        assert_eq!(strategies, vec![InjectionStrategy::Slow; 3]);
        assert_eq!(classifier.current_identity(), Some("code"));
    }

    #[test]
    fn test_window_change_triggers_new_lookup() {
        // Arrange
        let mut seq = Sequence::new();
        let mut foreground = MockForegroundQuery::new();
        foreground
            .expect_foreground_window()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(EDITOR);
        foreground
            .expect_process_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Some("notepad".to_string()));
        foreground
            .expect_foreground_window()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(TERMINAL);
        foreground
            .expect_process_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Some("WindowsTerminal".to_string()));
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        // Act
        let first = classifier.classify();
        let second = classifier.classify();

        // Assert
        assert_eq!(first, InjectionStrategy::Fast);
        assert_eq!(second, InjectionStrategy::Slow);
        assert_eq!(classifier.current_identity(), Some("windowsterminal"));
    }

    #[test]
    fn test_lookup_failure_defaults_to_fast_and_is_not_cached() {
        // Arrange
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().times(2).return_const(EDITOR);
        foreground.expect_process_identity().times(2).returning(|_| None);
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        // Act
        let first = classifier.classify();
        let second = classifier.classify();

        // Assert
        assert_eq!(first, InjectionStrategy::Fast);
        assert_eq!(second, InjectionStrategy::Fast);
        assert_eq!(classifier.current_identity(), None);
    }

    #[test]
    fn test_lookup_failure_drops_previous_cache_entry() {
        // Arrange
        let mut seq = Sequence::new();
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().times(1).in_sequence(&mut seq).return_const(EDITOR);
        foreground
            .expect_process_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Some("slack".to_string()));
        foreground.expect_foreground_window().times(1).in_sequence(&mut seq).return_const(TERMINAL);
        foreground.expect_process_identity().times(1).in_sequence(&mut seq).returning(|_| None);
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        // Act
        assert_eq!(classifier.classify(), InjectionStrategy::Slow);
        let after_failure = classifier.classify();

        // Assert
        assert_eq!(after_failure, InjectionStrategy::Fast);
        assert_eq!(classifier.current_identity(), None);
    }

    #[test]
    fn test_null_window_is_fast_without_process_lookup() {
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().return_const(WindowHandle::NULL);
        foreground.expect_process_identity().never();
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        assert_eq!(classifier.classify(), InjectionStrategy::Fast);
    }

    #[test]
    fn test_invalidate_forces_fresh_lookup() {
        // Arrange
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().times(2).return_const(EDITOR);
        foreground
            .expect_process_identity()
            .times(2)
            .returning(|_| Some("discord".to_string()));
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());

        // Act
        classifier.classify();
        classifier.invalidate();
        classifier.classify();

        // Assert: expectations verified on drop
        assert_eq!(classifier.current_identity(), Some("discord"));
    }

    #[test]
    fn test_set_rules_reclassifies_current_window() {
        // Arrange
        let mut foreground = MockForegroundQuery::new();
        foreground.expect_foreground_window().times(2).return_const(TERMINAL);
        foreground
            .expect_process_identity()
            .times(2)
            .returning(|_| Some("mintty.exe".to_string()));
        let mut classifier = AppClassifier::new(foreground, ClassificationRules::with_defaults());
        let before = classifier.classify();

        // Act
        let rules = ClassificationRules::new(DEFAULT_SLOW_APPS.iter().copied(), ["mintty"]);
        classifier.set_rules(rules);
        let after = classifier.classify();

        // Assert
        assert_eq!(before, InjectionStrategy::Slow);
        assert_eq!(after, InjectionStrategy::Clipboard);
    }
}

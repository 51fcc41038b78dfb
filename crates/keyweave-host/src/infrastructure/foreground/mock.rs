//! Scriptable foreground queries for tests.

use std::sync::Arc;

use keyweave_core::WindowHandle;
use parking_lot::Mutex;

use crate::application::classify_app::ForegroundQuery;

#[derive(Debug)]
struct State {
    window: WindowHandle,
    identity: Option<String>,
    lookups: u32,
}

/// A [`ForegroundQuery`] reporting one fixed window and process.
///
/// Clones share state; [`FixedForeground::switch_to`] simulates a focus change.
#[derive(Debug, Clone)]
pub struct FixedForeground {
    state: Arc<Mutex<State>>,
}

impl FixedForeground {
    pub fn new(window: WindowHandle, identity: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                window,
                identity: Some(identity.to_string()),
                lookups: 0,
            })),
        }
    }

    /// A foreground window whose process cannot be resolved.
    pub fn unresolvable(window: WindowHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(State { window, identity: None, lookups: 0 })),
        }
    }

    pub fn switch_to(&self, window: WindowHandle, identity: &str) {
        let mut state = self.state.lock();
        state.window = window;
        state.identity = Some(identity.to_string());
    }

    /// Number of process lookups performed.
    pub fn lookups(&self) -> u32 {
        self.state.lock().lookups
    }
}

impl ForegroundQuery for FixedForeground {
    fn foreground_window(&self) -> WindowHandle {
        self.state.lock().window
    }

    fn process_identity(&self, window: WindowHandle) -> Option<String> {
        let mut state = self.state.lock();
        state.lookups += 1;
        if window == state.window {
            state.identity.clone()
        } else {
            None
        }
    }
}

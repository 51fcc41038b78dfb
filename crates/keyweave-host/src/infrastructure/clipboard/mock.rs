//! In-memory clipboard for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::inject_text::{ClipboardAccess, ClipboardError};

#[derive(Debug, Default)]
struct State {
    text: Option<String>,
    writes: Vec<String>,
    clears: usize,
}

/// A [`ClipboardAccess`] that keeps its content in memory.
///
/// Clones share state, so a test can keep one clone for assertions after handing
/// the other to an injector.
#[derive(Debug, Clone, Default)]
pub struct RecordingClipboard {
    state: Arc<Mutex<State>>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::default();
        clipboard.state.lock().text = Some(text.to_string());
        clipboard
    }

    /// Every operation fails with [`ClipboardError::Unavailable`].
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Every `set_text` argument, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().writes.clone()
    }

    /// Number of successful `clear` calls.
    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    pub fn current(&self) -> Option<String> {
        self.state.lock().text.clone()
    }
}

impl ClipboardAccess for RecordingClipboard {
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("mock failure".into()));
        }
        Ok(self.state.lock().text.clone())
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("mock failure".into()));
        }
        let mut state = self.state.lock();
        state.text = Some(text.to_string());
        state.writes.push(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("mock failure".into()));
        }
        let mut state = self.state.lock();
        state.text = None;
        state.clears += 1;
        Ok(())
    }
}

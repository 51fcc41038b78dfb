//! System clipboard access for the paste injection strategy.

pub mod mock;

use arboard::Clipboard;

use crate::application::inject_text::{ClipboardAccess, ClipboardError};

/// [`ClipboardAccess`] backed by `arboard`.
///
/// A fresh OS handle is opened per operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }
}

fn open() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
}

impl ClipboardAccess for ArboardClipboard {
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        match open()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ClipboardError::Operation(e.to_string())),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        open()?
            .set_text(text)
            .map_err(|e| ClipboardError::Operation(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), ClipboardError> {
        open()?.clear().map_err(|e| ClipboardError::Operation(e.to_string()))
    }
}
